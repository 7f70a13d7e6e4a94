//! Per-file checks and batch partitioning.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::error::{InvalidFile, ValidationErrorKind};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Lower-cased extension with its leading dot (`"a.TXT"` → `".txt"`), or an
/// empty string when the file has none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().to_lowercase();
    if ext.is_empty() || ext == "." {
        return None;
    }
    if ext.starts_with('.') {
        Some(ext)
    } else {
        Some(format!(".{}", ext))
    }
}

fn extension_set<S: AsRef<str>>(exts: &[S]) -> BTreeSet<String> {
    exts.iter()
        .filter_map(|e| normalize_extension(e.as_ref()))
        .collect()
}

/// Constraints a file must satisfy to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    pub max_size_bytes: u64,
    allowed_extensions: Option<BTreeSet<String>>,
    forbidden_extensions: BTreeSet<String>,
    pub check_readable: bool,
}

impl ValidationConfig {
    /// No extension filters, readability checked.
    pub fn new(max_size_bytes: u64) -> Self {
        Self {
            max_size_bytes,
            allowed_extensions: None,
            forbidden_extensions: BTreeSet::new(),
            check_readable: true,
        }
    }

    /// Extensions are matched case-insensitively; a missing leading dot is added.
    pub fn with_forbidden_extensions<S: AsRef<str>>(mut self, exts: &[S]) -> Self {
        self.forbidden_extensions = extension_set(exts);
        self
    }

    pub fn with_allowed_extensions<S: AsRef<str>>(mut self, exts: &[S]) -> Self {
        self.allowed_extensions = Some(extension_set(exts));
        self
    }

    pub fn with_check_readable(mut self, check_readable: bool) -> Self {
        self.check_readable = check_readable;
        self
    }

    pub fn is_forbidden(&self, extension: &str) -> bool {
        normalize_extension(extension).is_some_and(|e| self.forbidden_extensions.contains(&e))
    }

    pub fn is_allowed(&self, extension: &str) -> bool {
        match &self.allowed_extensions {
            None => true,
            Some(allowed) => normalize_extension(extension).is_some_and(|e| allowed.contains(&e)),
        }
    }
}

/// A file that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFile {
    pub path: PathBuf,
    pub size: u64,
    pub extension: String,
    pub last_modified: SystemTime,
}

/// Check one file. Never panics and never returns an I/O error: unexpected
/// failures become `CheckFailed`.
pub fn validate_file(path: &Path, cfg: &ValidationConfig) -> Result<ValidFile, InvalidFile> {
    let reject = |kind: ValidationErrorKind, message: String| InvalidFile {
        path: path.to_path_buf(),
        kind,
        message,
    };

    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(reject(
                ValidationErrorKind::NotFound,
                "file does not exist".to_string(),
            ));
        }
        Err(e) => {
            return Err(reject(
                ValidationErrorKind::CheckFailed,
                format!("file check failed: {}", e),
            ));
        }
    };

    if !meta.is_file() {
        return Err(reject(
            ValidationErrorKind::NotFile,
            "not a regular file".to_string(),
        ));
    }

    let size = meta.len();
    if size > cfg.max_size_bytes {
        return Err(reject(
            ValidationErrorKind::SizeExceeded,
            format!(
                "file too large: {:.2}MB exceeds limit of {:.2}MB",
                bytes_to_mb(size),
                bytes_to_mb(cfg.max_size_bytes)
            ),
        ));
    }

    if size == 0 {
        return Err(reject(
            ValidationErrorKind::EmptyFile,
            "file is empty (0 bytes)".to_string(),
        ));
    }

    let extension = extension_of(path);
    if cfg.is_forbidden(&extension) {
        return Err(reject(
            ValidationErrorKind::ForbiddenExtension,
            format!("forbidden file type: {}", extension),
        ));
    }
    if !cfg.is_allowed(&extension) {
        let shown = if extension.is_empty() {
            "(none)"
        } else {
            extension.as_str()
        };
        return Err(reject(
            ValidationErrorKind::UnsupportedExtension,
            format!("unsupported file type: {}", shown),
        ));
    }

    if cfg.check_readable {
        if let Err(e) = fs::File::open(path) {
            return Err(reject(
                ValidationErrorKind::NotReadable,
                format!("file is not readable: {}", e),
            ));
        }
    }

    let last_modified = meta.modified().map_err(|e| {
        reject(
            ValidationErrorKind::CheckFailed,
            format!("file check failed: {}", e),
        )
    })?;

    Ok(ValidFile {
        path: path.to_path_buf(),
        size,
        extension,
        last_modified,
    })
}

/// Outcome of validating a batch. Input order is preserved within each list.
#[derive(Debug, Clone, Default)]
pub struct ValidationSummary {
    pub valid: Vec<ValidFile>,
    pub invalid: Vec<InvalidFile>,
    /// Sum of `size` over `valid`.
    pub total_size: u64,
}

impl ValidationSummary {
    pub fn valid_count(&self) -> usize {
        self.valid.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid.len()
    }

    pub fn total_size_mb(&self) -> f64 {
        bytes_to_mb(self.total_size)
    }
}

/// Validate every path and partition into accepted and rejected files.
pub fn validate_files<P: AsRef<Path>>(paths: &[P], cfg: &ValidationConfig) -> ValidationSummary {
    let mut summary = ValidationSummary::default();
    for path in paths {
        match validate_file(path.as_ref(), cfg) {
            Ok(file) => {
                summary.total_size += file.size;
                summary.valid.push(file);
            }
            Err(rejected) => {
                tracing::debug!(
                    path = %rejected.path.display(),
                    kind = %rejected.kind,
                    "rejected: {}",
                    rejected.message
                );
                summary.invalid.push(rejected);
            }
        }
    }
    tracing::info!(
        valid = summary.valid_count(),
        invalid = summary.invalid_count(),
        total_bytes = summary.total_size,
        "validation finished"
    );
    summary
}
