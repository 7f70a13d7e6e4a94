//! Retry loop: run an async operation until success or the policy says stop.

use std::future::Future;

use super::classify::{classify_category, ErrorCategory};
use super::error::TransferError;
use super::policy::{RetryDecision, RetryPolicy};

/// Per-operation retry state. Each upload owns one; nothing is shared
/// between sibling tasks.
///
/// With `adaptive` set, the first failure is classified and the policy is
/// replaced by the category's policy. That happens once: later failures
/// reuse the adapted policy even if they would classify differently.
#[derive(Debug, Clone, Copy)]
pub struct RetrySession {
    policy: RetryPolicy,
    adaptive: bool,
    retries: u32,
    adapted_to: Option<ErrorCategory>,
    first_failure_seen: bool,
}

impl RetrySession {
    pub fn new(policy: RetryPolicy, adaptive: bool) -> Self {
        Self {
            policy,
            adaptive,
            retries: 0,
            adapted_to: None,
            first_failure_seen: false,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Retries performed so far (attempts made = retries + 1).
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Category the policy was adapted to, if adaptation happened.
    pub fn adapted_to(&self) -> Option<ErrorCategory> {
        self.adapted_to
    }

    /// Record a failed attempt and decide whether to try again.
    pub fn on_failure(&mut self, e: &TransferError) -> RetryDecision {
        if !self.first_failure_seen {
            self.first_failure_seen = true;
            if self.adaptive {
                let category = classify_category(e);
                self.policy = RetryPolicy::for_category(category);
                self.adapted_to = Some(category);
            }
        }
        let decision = self.policy.decide(self.retries);
        if let RetryDecision::RetryAfter(_) = decision {
            self.retries += 1;
        }
        decision
    }
}

/// Runs `operation` up to `policy.max_attempts + 1` times with exponential
/// backoff and jitter between attempts. Returns the last error unmodified
/// once the (possibly adapted) policy is exhausted.
///
/// `label` is only used for logging (typically the object key).
pub async fn retry_with_backoff<T, F, Fut>(
    label: &str,
    policy: RetryPolicy,
    adaptive: bool,
    mut operation: F,
) -> Result<T, TransferError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransferError>>,
{
    let mut session = RetrySession::new(policy, adaptive);
    loop {
        match operation().await {
            Ok(value) => {
                if session.retries() > 0 {
                    tracing::info!(
                        key = label,
                        attempts = session.retries() + 1,
                        "upload succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(e) => match session.on_failure(&e) {
                RetryDecision::NoRetry => {
                    tracing::error!(
                        key = label,
                        attempts = session.retries() + 1,
                        error = %e,
                        "giving up"
                    );
                    return Err(e);
                }
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(
                        key = label,
                        attempt = session.retries(),
                        max_attempts = session.policy().max_attempts,
                        category = ?session.adapted_to(),
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            },
        }
    }
}
