//! `osup check` – enumerate and validate a source without uploading.

use anyhow::Result;
use osup_core::config::OsupConfig;
use osup_core::source::{collect_upload_items, UploadItem};
use osup_core::validate::{bytes_to_mb, validate_files, ValidationSummary};
use std::collections::HashSet;
use std::path::Path;

/// Collect items under `source`, validate them and print rejections.
/// Returns the items that passed validation, in walk order.
pub(super) fn validate_source(
    cfg: &OsupConfig,
    source: &Path,
    target: &str,
) -> Result<(Vec<UploadItem>, ValidationSummary)> {
    let items = collect_upload_items(source, target)?;
    let paths: Vec<_> = items.iter().map(|i| i.local_path.as_path()).collect();
    let summary = validate_files(&paths, &cfg.validation.to_validation_config());

    print_summary(&summary);

    let accepted: HashSet<&Path> = summary.valid.iter().map(|f| f.path.as_path()).collect();
    let valid_items = items
        .iter()
        .filter(|i| accepted.contains(i.local_path.as_path()))
        .cloned()
        .collect();
    Ok((valid_items, summary))
}

fn print_summary(summary: &ValidationSummary) {
    println!(
        "Validated {} file(s): {} ok ({:.2} MB), {} rejected",
        summary.valid_count() + summary.invalid_count(),
        summary.valid_count(),
        bytes_to_mb(summary.total_size),
        summary.invalid_count()
    );
    for rejected in &summary.invalid {
        println!("  rejected {}", rejected);
    }
}

pub fn run_check(cfg: &OsupConfig, source: &Path) -> Result<()> {
    let (_, summary) = validate_source(cfg, source, "")?;
    if summary.invalid_count() > 0 {
        anyhow::bail!("{} file(s) failed validation", summary.invalid_count());
    }
    Ok(())
}
