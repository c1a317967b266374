//! Retry policy for transient AnkiConnect failures.
//!
//! Anki runs as a local desktop process, so the budget is small and the
//! backoff short: by default three attempts with 1 s and 2 s pauses.

use std::time::Duration;
use tracing::debug;

/// Backoff factor for exponential delay.
pub const RETRY_BACKOFF_FACTOR: u32 = 2;

/// Upper bound for a single pause between attempts.
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

/// Bounded exponential retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Create a policy. A budget of zero still allows one attempt.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Total attempts allowed, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pause after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = RETRY_BACKOFF_FACTOR.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor).min(RETRY_MAX_DELAY)
    }

    /// Delay before the next attempt, or `None` once the budget is spent.
    pub fn next_delay(&self, failed_attempt: u32) -> Option<Duration> {
        if failed_attempt >= self.max_attempts {
            debug!(
                attempt = failed_attempt,
                max = self.max_attempts,
                "Max retry attempts reached"
            );
            return None;
        }

        let delay = self.delay_after(failed_attempt);
        debug!(
            attempt = failed_attempt,
            max = self.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Scheduling retry"
        );
        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_delay() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(4000));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::new(50, Duration::from_secs(1));
        assert_eq!(policy.delay_after(40), RETRY_MAX_DELAY);
    }

    #[test]
    fn test_next_delay_respects_budget() {
        let policy = RetryPolicy::new(3, Duration::from_millis(5));
        assert!(policy.next_delay(1).is_some());
        assert!(policy.next_delay(2).is_some());
        assert!(policy.next_delay(3).is_none());
    }

    #[test]
    fn test_zero_budget_means_single_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_millis(5));
        assert_eq!(policy.max_attempts(), 1);
        assert!(policy.next_delay(1).is_none());
    }
}
