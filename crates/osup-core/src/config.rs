use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::validate::ValidationConfig;

const MIB: u64 = 1024 * 1024;

/// Pre-flight validation parameters (`[validation]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSection {
    /// Largest file accepted for upload, in bytes.
    pub max_size_bytes: u64,
    /// Extensions that are always rejected (case-insensitive, e.g. ".exe").
    pub forbidden_extensions: Vec<String>,
    /// If set, only these extensions are accepted.
    #[serde(default)]
    pub allowed_extensions: Option<Vec<String>>,
    /// Open each file for reading during validation.
    pub check_readable: bool,
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            max_size_bytes: 500 * MIB,
            forbidden_extensions: [".exe", ".bat", ".cmd", ".scr", ".msi", ".dmg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_extensions: None,
            check_readable: true,
        }
    }
}

impl ValidationSection {
    pub fn to_validation_config(&self) -> ValidationConfig {
        let mut cfg = ValidationConfig::new(self.max_size_bytes)
            .with_forbidden_extensions(&self.forbidden_extensions)
            .with_check_readable(self.check_readable);
        if let Some(allowed) = &self.allowed_extensions {
            cfg = cfg.with_allowed_extensions(allowed);
        }
        cfg
    }
}

/// Initial retry policy (`[retry]` in config.toml). With `adaptive` on, the
/// policy is replaced after the first failure based on its classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_delay_ms: u64,
    /// Switch to a category-specific policy after the first failure.
    pub adaptive: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            adaptive: true,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::from_millis(self.max_attempts, self.base_delay_ms, self.max_delay_ms)
    }
}

/// HTTP backend timeouts (`[http]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Whole-request timeout for a single PUT attempt.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 300,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Global configuration loaded from `~/.config/osup/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsupConfig {
    /// Maximum number of uploads in flight at once.
    pub concurrency: usize,
    #[serde(default)]
    pub validation: ValidationSection,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for OsupConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            validation: ValidationSection::default(),
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("osup")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<OsupConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = OsupConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg: OsupConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
