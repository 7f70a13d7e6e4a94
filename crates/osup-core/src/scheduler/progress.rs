//! Progress reporting for a batch (tasks done, rate, ETA).
//!
//! The scheduler reports `(completed, total)` through its callback; the CLI
//! turns that into a `ProgressStats` snapshot to render rate and ETA.

/// Snapshot of batch progress (CLI-friendly).
#[derive(Debug, Clone, Copy)]
pub struct ProgressStats {
    /// Tasks finished so far, successful or not.
    pub completed: usize,
    pub total: usize,
    /// Elapsed time since the batch started (seconds).
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Completion rate in tasks per second (0 if elapsed is 0).
    pub fn per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.completed as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0 and work remains).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total.saturating_sub(self.completed);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_eta_and_fraction() {
        let s = ProgressStats {
            completed: 4,
            total: 10,
            elapsed_secs: 2.0,
        };
        assert_eq!(s.per_sec(), 2.0);
        assert_eq!(s.eta_secs(), Some(3.0));
        assert!((s.fraction() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn zero_elapsed_has_no_eta() {
        let s = ProgressStats {
            completed: 0,
            total: 3,
            elapsed_secs: 0.0,
        };
        assert_eq!(s.per_sec(), 0.0);
        assert_eq!(s.eta_secs(), None);
    }

    #[test]
    fn empty_batch_is_complete() {
        let s = ProgressStats {
            completed: 0,
            total: 0,
            elapsed_secs: 0.0,
        };
        assert_eq!(s.fraction(), 1.0);
        assert_eq!(s.eta_secs(), Some(0.0));
    }
}
