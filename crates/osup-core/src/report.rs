//! Batch outcome: per-item results plus failures grouped by classification.

use std::path::PathBuf;
use std::time::Duration;

use crate::retry::{classify, ErrorCategory, ErrorClassification, TransferError};
use crate::scheduler::{TaskError, TaskResult};
use crate::source::UploadItem;
use crate::store::PutReceipt;

pub type UploadResult = TaskResult<PutReceipt, TransferError>;

/// Classification of a failed task. Panics and other scheduler-level
/// failures have no transfer error to inspect and count as unknown.
pub fn classify_task_error(e: &TaskError<TransferError>) -> ErrorClassification {
    match e {
        TaskError::Task(e) => classify(e),
        TaskError::Panicked(_) => ErrorCategory::Unknown.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEntry {
    pub key: String,
    pub local_path: PathBuf,
    pub message: String,
}

/// Failed files sharing one category, with the advice for that category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureGroup {
    pub classification: ErrorClassification,
    pub files: Vec<FailureEntry>,
}

#[derive(Debug)]
pub struct BatchReport {
    pub items: Vec<UploadItem>,
    /// Same length and order as `items`.
    pub results: Vec<UploadResult>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn new(items: Vec<UploadItem>, results: Vec<UploadResult>, elapsed: Duration) -> Self {
        debug_assert_eq!(items.len(), results.len());
        Self {
            items,
            results,
            elapsed,
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn successes(&self) -> impl Iterator<Item = (&UploadItem, &PutReceipt)> {
        self.items
            .iter()
            .zip(&self.results)
            .filter_map(|(item, r)| r.payload().map(|p| (item, p)))
    }

    /// Failures grouped by category, groups in order of first occurrence.
    pub fn failure_groups(&self) -> Vec<FailureGroup> {
        let mut groups: Vec<FailureGroup> = Vec::new();
        for (item, result) in self.items.iter().zip(&self.results) {
            let Some(err) = result.error() else {
                continue;
            };
            let classification = classify_task_error(err);
            let entry = FailureEntry {
                key: item.key.clone(),
                local_path: item.local_path.clone(),
                message: err.to_string(),
            };
            match groups
                .iter_mut()
                .find(|g| g.classification.category == classification.category)
            {
                Some(group) => group.files.push(entry),
                None => groups.push(FailureGroup {
                    classification,
                    files: vec![entry],
                }),
            }
        }
        groups
    }

    pub fn files_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.total() as f64 / secs
    }
}
