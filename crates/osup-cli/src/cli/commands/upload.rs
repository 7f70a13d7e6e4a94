//! `osup upload` – validate, check the store is reachable, then upload with progress.

use anyhow::{bail, Result};
use osup_core::config::OsupConfig;
use osup_core::report::{BatchReport, UploadResult};
use osup_core::retry::classify;
use osup_core::scheduler::ProgressStats;
use osup_core::store;
use osup_core::upload::{upload_all, UploadOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

use super::check::validate_source;

const PROGRESS_INTERVAL_MS: u128 = 500;

pub async fn run_upload(
    cfg: &OsupConfig,
    source: &Path,
    target: &str,
    endpoint: &str,
    token: Option<String>,
) -> Result<()> {
    let (items, _) = validate_source(cfg, source, target)?;
    if items.is_empty() {
        bail!("no valid files to upload from {}", source.display());
    }

    let store = store::open(endpoint, token, &cfg.http)?;
    if let Err(e) = store.check_reachable().await {
        let class = classify(&e);
        println!("Cannot reach {}: {}", store.describe(), e);
        println!("  {} ({}): {}", class.description, class.category, class.suggestion);
        bail!("destination check failed");
    }

    println!(
        "Uploading {} file(s) to {} (concurrency {})",
        items.len(),
        store.describe(),
        cfg.concurrency
    );

    let started = Instant::now();
    let mut last_print: Option<Instant> = None;
    let on_progress = move |completed: usize, total: usize, _: &UploadResult| {
        let now = Instant::now();
        let due = last_print
            .map(|t| now.duration_since(t).as_millis() >= PROGRESS_INTERVAL_MS)
            .unwrap_or(true);
        if !due && completed < total {
            return;
        }
        let stats = ProgressStats {
            completed,
            total,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };
        // Redraw in place; finish the line once everything is done.
        print!("{}", progress_line(&stats));
        if completed >= total {
            println!();
        }
        let _ = io::stdout().flush();
        last_print = Some(now);
    };

    let report = upload_all(store, items, UploadOptions::from_config(cfg), on_progress).await;
    print_report(&report);

    if !report.is_success() {
        bail!("{} of {} upload(s) failed", report.failed(), report.total());
    }
    Ok(())
}

/// One in-place progress line: carriage return, no trailing newline.
pub(crate) fn progress_line(stats: &ProgressStats) -> String {
    let eta = stats
        .eta_secs()
        .map(|s| format!("{:.0}s", s))
        .unwrap_or_else(|| "?".to_string());
    format!(
        "\r  {} / {} files ({:.1}%)  {:.2} files/s  ETA {}  ",
        stats.completed,
        stats.total,
        stats.fraction() * 100.0,
        stats.per_sec(),
        eta
    )
}

/// Summary, each uploaded object's URL, then failures grouped by category.
pub(crate) fn report_lines(report: &BatchReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Done: {} succeeded, {} failed in {:.1}s ({:.2} files/s)",
        report.succeeded(),
        report.failed(),
        report.elapsed.as_secs_f64(),
        report.files_per_sec()
    )];
    for (item, receipt) in report.successes() {
        lines.push(format!(
            "  uploaded {} -> {}",
            item.local_path.display(),
            receipt.url
        ));
    }
    for group in report.failure_groups() {
        let class = &group.classification;
        lines.push(format!(
            "{} ({}): {} file(s)",
            class.description,
            class.category,
            group.files.len()
        ));
        lines.push(format!("  suggestion: {}", class.suggestion));
        for f in &group.files {
            lines.push(format!("  {}: {}", f.key, f.message));
        }
    }
    lines
}

fn print_report(report: &BatchReport) {
    for line in report_lines(report) {
        println!("{}", line);
    }
}
