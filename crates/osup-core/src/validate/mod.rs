//! Pre-flight file validation.
//!
//! Before anything is uploaded, every candidate path is checked for
//! existence, file type, size (empty files included), extension and
//! readability. Rejected files are reported with a reason and skipped; they
//! never abort the batch.

mod check;
mod error;

pub use check::{
    bytes_to_mb, extension_of, validate_file, validate_files, ValidFile, ValidationConfig,
    ValidationSummary,
};
pub use error::{InvalidFile, ValidationErrorKind};
