//! Retry and backoff policy.
//!
//! This module encapsulates error classification (network, permission,
//! missing file, bucket misconfiguration, server) and exponential backoff
//! decisions so that the upload pipeline and the final report share one
//! notion of what a failure means.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_category, ErrorCategory, ErrorClassification};
pub use error::TransferError;
pub use policy::{RetryDecision, RetryPolicy};
pub use run::{retry_with_backoff, RetrySession};
