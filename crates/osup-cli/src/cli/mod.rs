//! CLI for the OSUP bulk uploader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use osup_core::config::{self, OsupConfig};
use std::path::PathBuf;

use commands::{run_check, run_upload};

const MIB: u64 = 1024 * 1024;

/// Top-level CLI for the OSUP uploader.
#[derive(Debug, Parser)]
#[command(name = "osup")]
#[command(about = "OSUP: bulk file uploader for object storage", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Validate and upload a file or directory tree.
    Upload {
        /// Local file or directory to upload.
        #[arg(long, value_name = "PATH")]
        source: PathBuf,
        /// Key prefix under which files are stored (e.g. "backups/2024").
        #[arg(long, value_name = "PREFIX", default_value = "")]
        target: String,
        /// Store endpoint: http(s)://host/bucket or file:///dir.
        #[arg(long, value_name = "URL")]
        endpoint: String,
        /// Bearer token sent with every request.
        #[arg(long, env = "OSUP_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Uploads in flight at once (overrides config).
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
        /// Reject files larger than N MiB (overrides config).
        #[arg(long, value_name = "N")]
        max_size_mb: Option<u64>,
        /// Keep the configured retry policy instead of adapting it to the first failure.
        #[arg(long)]
        no_adaptive: bool,
    },

    /// Validate a file or directory tree without uploading.
    Check {
        /// Local file or directory to check.
        #[arg(long, value_name = "PATH")]
        source: PathBuf,
        /// Reject files larger than N MiB (overrides config).
        #[arg(long, value_name = "N")]
        max_size_mb: Option<u64>,
    },
}

/// Fold command-line overrides into the loaded config.
fn apply_overrides(
    cfg: &mut OsupConfig,
    concurrency: Option<usize>,
    max_size_mb: Option<u64>,
    no_adaptive: bool,
) {
    if let Some(n) = concurrency {
        cfg.concurrency = n;
    }
    if let Some(mb) = max_size_mb {
        cfg.validation.max_size_bytes = mb.saturating_mul(MIB);
    }
    if no_adaptive {
        cfg.retry.adaptive = false;
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Upload {
                source,
                target,
                endpoint,
                token,
                concurrency,
                max_size_mb,
                no_adaptive,
            } => {
                apply_overrides(&mut cfg, concurrency, max_size_mb, no_adaptive);
                run_upload(&cfg, &source, &target, &endpoint, token).await?;
            }
            CliCommand::Check {
                source,
                max_size_mb,
            } => {
                apply_overrides(&mut cfg, None, max_size_mb, false);
                run_check(&cfg, &source)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
