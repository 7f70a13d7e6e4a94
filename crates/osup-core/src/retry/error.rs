//! Transfer error type for retry classification.

use std::io;
use thiserror::Error;

/// Failure of a single put-object attempt, as reported by a store backend.
///
/// Carries the raw message plus whatever status/code the backend could
/// extract, so the classifier can decide without knowing the backend.
///
/// Local paths and object keys go in `context`, never in `message`: the
/// classifier matches on `message`, and a user-chosen name must not change
/// the category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.context, .message))]
pub struct TransferError {
    pub message: String,
    /// HTTP status, if the request got a response.
    pub status: Option<u16>,
    /// Symbolic code (`NoSuchBucket`, `ECONNREFUSED`, ...).
    pub code: Option<String>,
    /// What was being done, e.g. "open /data/a.txt". Display only.
    pub context: Option<String>,
}

fn render(context: &Option<String>, message: &str) -> String {
    match context {
        Some(c) => format!("{}: {}", c, message),
        None => message.to_string(),
    }
}

impl TransferError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code: None,
            context: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Map a local I/O failure (opening or reading the source file) to the
    /// errno-style codes the classifier understands.
    pub fn from_io(context: &str, e: &io::Error) -> Self {
        let err = Self::new(e.to_string()).with_context(context);
        match e.kind() {
            io::ErrorKind::NotFound => err.with_code("ENOENT"),
            io::ErrorKind::PermissionDenied => err.with_code("EACCES"),
            io::ErrorKind::ConnectionRefused => err.with_code("ECONNREFUSED"),
            io::ErrorKind::ConnectionReset => err.with_code("ECONNRESET"),
            io::ErrorKind::TimedOut => err.with_code("ETIMEDOUT"),
            io::ErrorKind::BrokenPipe => err.with_code("EPIPE"),
            _ => err,
        }
    }
}
