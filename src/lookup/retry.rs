//! Retry policy with configurable backoff
//!
//! The policy is a pure description: it knows how many attempts are allowed
//! and how long to wait after a given failure, but never touches a clock.
//! The lookup client's retry loop asks it for durations and does the
//! sleeping, which keeps every delay decision assertable in tests without
//! waiting.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for lookup attempts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempt budget; a lookup never issues more requests than this
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay, shared with the pipeline's inter-request spacing
    #[serde(default = "default_base_delay", with = "humantime_serde")]
    pub base_delay: Duration,

    /// Multiplier applied exponentially after rate limiting
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_backoff_factor() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay: default_base_delay(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy. A zero attempt budget is clamped to one so a lookup
    /// always gets at least one request.
    pub fn new(max_retries: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_retries: max_retries.max(1),
            base_delay,
            backoff_factor,
        }
    }

    /// Exponential wait after failed attempt `attempt` (0-based): used for
    /// rate limiting and transport failures.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_factor.powi(attempt as i32);
        Duration::from_secs_f64(self.base_delay.as_secs_f64() * multiplier)
    }

    /// Linear wait after failed attempt `attempt` (0-based): used for
    /// unexpected statuses and undecodable bodies.
    pub fn linear_delay(&self, attempt: u32) -> Duration {
        self.base_delay * (attempt + 1)
    }

    /// Whether the budget is spent after `attempts_made` requests
    pub fn is_exhausted(&self, attempts_made: u32) -> bool {
        attempts_made >= self.max_retries.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_delays_grow_exponentially() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2), 2.0);
        assert_eq!(policy.backoff_delay(0), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(8));
    }

    #[test]
    fn backoff_supports_fractional_factors() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2), 1.5);
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(4500));
    }

    #[test]
    fn linear_delays_grow_by_base_increments() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2), 2.0);
        assert_eq!(policy.linear_delay(0), Duration::from_secs(2));
        assert_eq!(policy.linear_delay(1), Duration::from_secs(4));
        assert_eq!(policy.linear_delay(2), Duration::from_secs(6));
    }

    #[test]
    fn zero_budget_is_clamped_to_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1), 2.0);
        assert!(!policy.is_exhausted(0));
        assert!(policy.is_exhausted(1));
    }

    #[test]
    fn exhaustion_tracks_the_attempt_budget() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
        assert!(policy.is_exhausted(4));
    }

    #[test]
    fn deserializes_with_defaults() {
        let policy: RetryPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert_eq!(policy.backoff_factor, 2.0);
    }
}
