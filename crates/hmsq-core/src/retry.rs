//! Exponential-backoff retry policy.
//!
//! Pure delay computation plus a small blocking driver. The connector never
//! retries on its own; callers opt in by wrapping operations in [`RetryPolicy::run`]
//! (or their own loop over [`RetryPolicy::compute_delay`] /
//! [`RetryPolicy::should_retry`]), which keeps the connector deterministic
//! and testable in isolation.

use crate::error::Result;
use std::time::Duration;
use tracing::debug;

/// Exponential backoff configuration for metastore calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first call
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u32,
    /// Maximum delay cap, in milliseconds
    pub max_delay_ms: u32,
    /// Multiplicative backoff factor applied per retry
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Compute the delay before retry number `attempt` (1-indexed: attempt 1
    /// is the first retry).
    ///
    /// Returns `min(initial_delay × multiplier^(attempt−1), max_delay)` for
    /// `1 ≤ attempt < max_attempts`, and zero otherwise (no more retries).
    pub fn compute_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 || attempt >= self.max_attempts {
            return Duration::ZERO;
        }
        let raw = f64::from(self.initial_delay_ms)
            * self.backoff_multiplier.powi(attempt as i32 - 1);
        let bounded = raw.min(f64::from(self.max_delay_ms));
        Duration::from_millis(bounded as u64)
    }

    /// Whether another attempt should be made after `attempts_made` calls.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Drive a fallible operation through the policy, sleeping between
    /// attempts. Non-retryable errors and exhaustion return the last error.
    pub fn run<T>(&self, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempts_made = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempts_made += 1;
                    if !err.retryable() || !self.should_retry(attempts_made) {
                        return Err(err);
                    }
                    let delay = self.compute_delay(attempts_made);
                    debug!(
                        attempt = attempts_made,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying metastore operation"
                    );
                    std::thread::sleep(delay);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetastoreError;
    use std::cell::Cell;

    #[test]
    fn test_compute_delay_schedule() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_delay_ms: 100,
            max_delay_ms: 450,
            backoff_multiplier: 2.0,
        };
        assert_eq!(policy.compute_delay(0), Duration::ZERO);
        assert_eq!(policy.compute_delay(1), Duration::from_millis(100));
        assert_eq!(policy.compute_delay(2), Duration::from_millis(200));
        assert_eq!(policy.compute_delay(3), Duration::from_millis(400));
        assert_eq!(policy.compute_delay(4), Duration::ZERO);
        assert_eq!(policy.compute_delay(50), Duration::ZERO);
    }

    #[test]
    fn test_compute_delay_caps_at_max() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay_ms: 100,
            max_delay_ms: 450,
            backoff_multiplier: 2.0,
        };
        assert_eq!(policy.compute_delay(3), Duration::from_millis(400));
        assert_eq!(policy.compute_delay(4), Duration::from_millis(450));
        assert_eq!(policy.compute_delay(9), Duration::from_millis(450));
    }

    #[test]
    fn test_should_retry_boundary() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(100));
    }

    #[test]
    fn test_run_retries_transient_until_success() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            backoff_multiplier: 2.0,
        };
        let calls = Cell::new(0u32);
        let result = policy.run(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(MetastoreError::transient("flaky"))
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_run_retries_with_zero_initial_delay() {
        // A zero delay means an immediate retry, not fewer attempts.
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 2.0,
        };
        let calls = Cell::new(0u32);
        let result = policy.run(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(MetastoreError::transient("flaky"))
            } else {
                Ok("up")
            }
        });
        assert_eq!(result.unwrap(), "up");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_run_does_not_retry_non_retryable() {
        let policy = RetryPolicy::default();
        let calls = Cell::new(0u32);
        let result: Result<()> = policy.run(|| {
            calls.set(calls.get() + 1);
            Err(MetastoreError::not_found("no such table"))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_run_exhausts_attempts() {
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_delay_ms: 1,
            max_delay_ms: 1,
            backoff_multiplier: 1.0,
        };
        let calls = Cell::new(0u32);
        let result: Result<()> = policy.run(|| {
            calls.set(calls.get() + 1);
            Err(MetastoreError::transient("down"))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }
}
