//! Rejection reasons for pre-flight validation.

use std::fmt;
use std::path::PathBuf;

/// Why a file was rejected. Checks run in declaration order and the first
/// failing one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    NotFound,
    NotFile,
    SizeExceeded,
    /// Zero-byte file.
    EmptyFile,
    ForbiddenExtension,
    UnsupportedExtension,
    NotReadable,
    /// Unexpected I/O failure while checking (e.g. stat denied).
    CheckFailed,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::NotFound => "not_found",
            ValidationErrorKind::NotFile => "not_file",
            ValidationErrorKind::SizeExceeded => "size_exceeded",
            ValidationErrorKind::EmptyFile => "empty_file",
            ValidationErrorKind::ForbiddenExtension => "forbidden_extension",
            ValidationErrorKind::UnsupportedExtension => "unsupported_extension",
            ValidationErrorKind::NotReadable => "not_readable",
            ValidationErrorKind::CheckFailed => "check_failed",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected file with its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFile {
    pub path: PathBuf,
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl fmt::Display for InvalidFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path.display(), self.message, self.kind)
    }
}

impl std::error::Error for InvalidFile {}
