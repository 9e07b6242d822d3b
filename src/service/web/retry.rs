//! Bounded retry policy for outbound HTTP calls.

use std::time::Duration;

/// Statuses that are worth retrying: rate limiting and transient server errors.
pub const DEFAULT_RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// How many times to try a request, and how long to wait in between.
///
/// Delays grow exponentially: `base_delay`, `2 * base_delay`, `4 * base_delay`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub retryable_statuses: Vec<u16>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }

    /// A single attempt, no retries.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed with `status`.
    pub fn should_retry(&self, attempt: u32, status: u16) -> bool {
        attempt < self.max_attempts && self.is_retryable(status)
    }

    /// Backoff before the attempt following `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(2u32.pow(exponent))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_exponential() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));

        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
    }

    #[test]
    fn test_only_transient_statuses_retry() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(1, 429));
        assert!(policy.should_retry(2, 503));
        assert!(!policy.should_retry(3, 503));
        assert!(!policy.should_retry(1, 403));
        assert!(!policy.should_retry(1, 404));
    }

    #[test]
    fn test_once_never_retries() {
        let policy = RetryPolicy::once();

        assert_eq!(policy.max_attempts, 1);
        assert!(!policy.should_retry(1, 429));
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
