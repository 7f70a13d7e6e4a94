use rand::Rng;
use std::time::Duration;

use super::classify::ErrorCategory;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry; surface the last error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with a cap and 10% jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = try once).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on the un-jittered backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_millis(3, 1000, 30_000)
    }
}

impl RetryPolicy {
    pub const fn from_millis(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// Policy for a classified failure.
    ///
    /// Transient network faults get many slow retries; permission gets one
    /// confirmation retry; a missing file cannot heal so it is never retried.
    pub fn for_category(category: ErrorCategory) -> Self {
        match category {
            ErrorCategory::Network => Self::from_millis(5, 2000, 60_000),
            ErrorCategory::Server => Self::from_millis(3, 5000, 30_000),
            ErrorCategory::Permission => Self::from_millis(1, 1000, 1000),
            ErrorCategory::File => Self::from_millis(0, 0, 0),
            ErrorCategory::StorageService | ErrorCategory::Unknown => {
                Self::from_millis(3, 1000, 30_000)
            }
        }
    }

    /// Un-jittered delay before retry `retry` (0-based): `min(base * 2^retry, max)`.
    pub fn base_backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Delay before retry `retry` with up to 10% random jitter added.
    pub fn backoff(&self, retry: u32) -> Duration {
        let delay = self.base_backoff(retry);
        let jitter_range = delay.as_millis() as u64 / 10;
        if jitter_range == 0 {
            return delay;
        }
        let jitter = rand::rng().random_range(0..=jitter_range);
        delay + Duration::from_millis(jitter)
    }

    /// Decide what to do after retry number `retry` would be next
    /// (i.e. `retry` failed attempts beyond the first have already happened).
    pub fn decide(&self, retry: u32) -> RetryDecision {
        if retry >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.backoff(retry))
    }
}
