//! Exponential-backoff retry delay computation and transient-vs-permanent
//! status classification. `should_retry` inspects a `BackendResult` status
//! rather than a thrown exception: every backend translates transport
//! failures into a synthetic status before they reach the retry layer, so
//! classification stays status-code based throughout.

use std::time::Duration;

/// `delay = min(initial * factor^(attempt-1), max)`, attempt is 1-based.
#[derive(Debug, Clone, Copy)]
pub struct RetryStrategy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
        }
    }
}

impl RetryStrategy {
    #[must_use]
    pub fn new(initial_delay: Duration, max_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            initial_delay,
            max_delay,
            backoff_factor,
        }
    }

    /// Delay before attempt `n` (1-based; `get_delay(1)` is the wait before
    /// the *second* attempt).
    #[must_use]
    pub fn get_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.backoff_factor.powi(exponent as i32);
        let delay = self.initial_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }

    /// Transient-category failures are retried: connection errors and
    /// timeouts (synthetic 503/504), any 5xx, and 429. Explicit 4xx other
    /// than 429 (including the synthetic 403 policy-refusal and 400
    /// malformed-input statuses) are not retried.
    #[must_use]
    pub fn should_retry(status: u16) -> bool {
        status == 429 || (500..=599).contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_by_backoff_factor() {
        let strategy = RetryStrategy::new(Duration::from_millis(100), Duration::from_secs(10), 2.0);
        assert_eq!(strategy.get_delay(1), Duration::from_millis(100));
        assert_eq!(strategy.get_delay(2), Duration::from_millis(200));
        assert_eq!(strategy.get_delay(3), Duration::from_millis(400));
    }

    #[test]
    fn delay_is_capped_at_max() {
        let strategy = RetryStrategy::new(Duration::from_secs(1), Duration::from_secs(5), 10.0);
        assert_eq!(strategy.get_delay(5), Duration::from_secs(5));
    }

    #[test]
    fn retries_server_errors_and_rate_limit() {
        assert!(RetryStrategy::should_retry(500));
        assert!(RetryStrategy::should_retry(503));
        assert!(RetryStrategy::should_retry(504));
        assert!(RetryStrategy::should_retry(429));
    }

    #[test]
    fn does_not_retry_other_client_errors() {
        assert!(!RetryStrategy::should_retry(404));
        assert!(!RetryStrategy::should_retry(403));
        assert!(!RetryStrategy::should_retry(400));
    }
}
