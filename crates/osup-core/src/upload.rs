//! Upload pipeline: one retry-guarded put per item, run on the bounded pool.

use std::sync::Arc;
use std::time::Instant;

use crate::config::OsupConfig;
use crate::report::{BatchReport, UploadResult};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::scheduler::run_bounded;
use crate::source::UploadItem;
use crate::store::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Uploads in flight at once (clamped to 1..=items).
    pub concurrency: usize,
    /// Policy in effect until the first failure of each upload.
    pub retry: RetryPolicy,
    /// Re-derive the policy from the first failure's category.
    pub adaptive: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            concurrency: 5,
            retry: RetryPolicy::default(),
            adaptive: true,
        }
    }
}

impl UploadOptions {
    pub fn from_config(cfg: &OsupConfig) -> Self {
        Self {
            concurrency: cfg.concurrency,
            retry: cfg.retry.policy(),
            adaptive: cfg.retry.adaptive,
        }
    }
}

/// Upload every item through `store` and collect a report.
///
/// The store is shared by all tasks through the `Arc`; each task runs its
/// own retry session. Never fails as a whole: every item ends up as a
/// success or a failure in the report.
pub async fn upload_all<S, P>(
    store: Arc<S>,
    items: Vec<UploadItem>,
    options: UploadOptions,
    on_progress: P,
) -> BatchReport
where
    S: ObjectStore + ?Sized + 'static,
    P: FnMut(usize, usize, &UploadResult) + Send + 'static,
{
    let started = Instant::now();
    tracing::info!(
        files = items.len(),
        concurrency = options.concurrency,
        destination = %store.describe(),
        "upload batch starting"
    );

    let tasks: Vec<_> = items
        .iter()
        .map(|item| {
            let store = Arc::clone(&store);
            let item = item.clone();
            move || async move {
                retry_with_backoff(&item.key, options.retry, options.adaptive, || {
                    store.put_object(&item.local_path, &item.key)
                })
                .await
            }
        })
        .collect();

    let results = run_bounded(tasks, options.concurrency, on_progress).await;
    let report = BatchReport::new(items, results, started.elapsed());

    tracing::info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "upload batch finished"
    );
    report
}
