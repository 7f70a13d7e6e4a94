//! Classify transfer failures into categories that drive retry policy and
//! the grouping in the final report.

use super::error::TransferError;
use std::fmt;

/// Stable category assigned to a failed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCategory {
    /// DNS failure, refused/reset connection, timeout.
    Network,
    /// Forbidden, bad credentials, local permission denied.
    Permission,
    /// Missing local file or missing object key.
    File,
    /// Bucket/container missing or misconfigured.
    StorageService,
    /// Remote 5xx.
    Server,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Permission => "permission",
            ErrorCategory::File => "file",
            ErrorCategory::StorageService => "storage-service",
            ErrorCategory::Server => "server",
            ErrorCategory::Unknown => "unknown",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Network connection error",
            ErrorCategory::Permission => "Permission or credential error",
            ErrorCategory::File => "File or object not found",
            ErrorCategory::StorageService => "Storage bucket not found",
            ErrorCategory::Server => "Storage server error",
            ErrorCategory::Unknown => "Unknown error",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check network connectivity or retry later",
            ErrorCategory::Permission => {
                "Check the access token and that it may write to the target prefix"
            }
            ErrorCategory::File => "Check that the local file still exists and is readable",
            ErrorCategory::StorageService => "Check the bucket name and region in the endpoint",
            ErrorCategory::Server => "The storage service is failing; retry later",
            ErrorCategory::Unknown => "Inspect the error message and the log file for details",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category plus the fixed human-readable text that goes with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorClassification {
    pub category: ErrorCategory,
    pub description: &'static str,
    pub suggestion: &'static str,
}

impl From<ErrorCategory> for ErrorClassification {
    fn from(category: ErrorCategory) -> Self {
        Self {
            category,
            description: category.description(),
            suggestion: category.suggestion(),
        }
    }
}

const NETWORK_MARKERS: &[&str] = &[
    "enotfound",
    "econnrefused",
    "econnreset",
    "etimedout",
    "eai_again",
    "getaddrinfo",
    "could not resolve",
    "couldn't resolve",
    "connection refused",
    "timed out",
    "timeout",
];

const NETWORK_CODES: &[&str] = &[
    "ENOTFOUND",
    "ECONNREFUSED",
    "ECONNRESET",
    "ETIMEDOUT",
    "EAI_AGAIN",
    "EPIPE",
    "ConnectionTimeoutError",
    "RequestError",
];

const PERMISSION_MARKERS: &[&str] = &[
    "access denied",
    "accessdenied",
    "forbidden",
    "invalidaccesskeyid",
    "signaturedoesnotmatch",
    "permission denied",
];

const PERMISSION_CODES: &[&str] = &[
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "EACCES",
    "EPERM",
];

const FILE_MARKERS: &[&str] = &["no such file", "enoent", "not found", "does not exist"];

const FILE_CODES: &[&str] = &["NoSuchKey", "ENOENT"];

fn code_in(code: Option<&str>, set: &[&str]) -> bool {
    code.is_some_and(|c| set.iter().any(|s| s.eq_ignore_ascii_case(c)))
}

fn message_has(message: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| message.contains(m))
}

/// Classify a transfer failure. Total and deterministic: rules are checked
/// in a fixed order and the first match wins.
pub fn classify(e: &TransferError) -> ErrorClassification {
    classify_category(e).into()
}

pub fn classify_category(e: &TransferError) -> ErrorCategory {
    let message = e.message.to_lowercase();
    let code = e.code.as_deref();

    if message_has(&message, NETWORK_MARKERS) || code_in(code, NETWORK_CODES) {
        return ErrorCategory::Network;
    }
    if matches!(e.status, Some(401 | 403))
        || code_in(code, PERMISSION_CODES)
        || message_has(&message, PERMISSION_MARKERS)
    {
        return ErrorCategory::Permission;
    }
    if code_in(code, FILE_CODES) || message_has(&message, FILE_MARKERS) {
        return ErrorCategory::File;
    }
    if code_in(code, &["NoSuchBucket"]) {
        return ErrorCategory::StorageService;
    }
    if e.status.is_some_and(|s| s >= 500) {
        return ErrorCategory::Server;
    }
    ErrorCategory::Unknown
}
