//! Bounded exponential backoff for feed-triggered refetches.

use std::time::Duration;

/// Retry schedule for transient refresh failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay in milliseconds.
    pub max_delay_ms: u64,
    /// Backoff multiplier (e.g., 2.0 for exponential).
    pub backoff_multiplier: f64,
    /// Total attempts including the first one.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 100,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Create from config values.
    pub fn from_config(max_attempts: u32, initial_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay_ms,
            ..Default::default()
        }
    }

    /// Delay to wait after the given failed attempt (0-based).
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let delay_ms =
            self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let clamped_ms = delay_ms.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(clamped_ms)
    }

    /// Whether another attempt is allowed after `attempt` failed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_and_clamp() {
        let policy = RetryPolicy {
            initial_delay_ms: 100,
            max_delay_ms: 500,
            backoff_multiplier: 2.0,
            max_attempts: 10,
        };
        assert_eq!(policy.next_delay(0), Duration::from_millis(100));
        assert_eq!(policy.next_delay(1), Duration::from_millis(200));
        assert_eq!(policy.next_delay(2), Duration::from_millis(400));
        assert_eq!(policy.next_delay(3), Duration::from_millis(500));
        assert_eq!(policy.next_delay(20), Duration::from_millis(500));
    }

    #[test]
    fn attempts_are_bounded() {
        let policy = RetryPolicy::from_config(3, 10);
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));

        let single = RetryPolicy::from_config(0, 10);
        assert_eq!(single.max_attempts, 1);
        assert!(!single.should_retry(0));
    }
}
