//! Retry policy for candidate fetches.
//!
//! Fixed delay between attempts with a hard attempt cap.

use crate::config::RecommendationSettings;
use crate::spotify::SupplierError;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total fetch attempts per request, including the first one.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RecommendationSettings) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// `attempt` is 1-based and counts the attempt that just finished.
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Non-transient errors are never retried.
    pub fn should_retry(&self, error: &SupplierError, attempt: u32) -> bool {
        error.is_transient() && self.has_attempts_left(attempt)
    }

    pub fn wait(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RecommendationSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 50);
        assert_eq!(policy.delay, Duration::from_millis(250));
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::ZERO,
        };
        assert!(policy.should_retry(&SupplierError::RateLimited, 1));
        assert!(policy.should_retry(&SupplierError::Timeout, 2));
        assert!(!policy.should_retry(&SupplierError::Timeout, 3));
        assert!(!policy.should_retry(&SupplierError::NoSeeds, 1));
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        let settings = RecommendationSettings {
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(RetryPolicy::new(&settings).max_attempts, 1);
    }
}
