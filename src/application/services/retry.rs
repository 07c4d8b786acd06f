//! Publish Retry Policy
//!
//! Bounded exponential backoff for transient publish failures. The policy
//! is an explicit state machine, Attempting(n) -> Success | Attempting(n+1)
//! | Exhausted, so the publisher loop stays deterministic and testable
//! under paused time.

use std::time::Duration;

/// Configuration for the publish retry loop.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of publish attempts per record.
    pub max_attempts: u32,
    /// Base of the exponential backoff; the sleep after failed attempt `n`
    /// is `base^n` seconds.
    pub backoff_base_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_secs: 2,
        }
    }
}

/// Bounded exponential backoff over one record's publish attempts.
///
/// With the default config the delays are 2s after attempt 1 and 4s after
/// attempt 2; there is no sleep after the final attempt.
#[derive(Debug)]
pub struct BackoffPolicy {
    config: RetryConfig,
    attempt: u32,
}

impl BackoffPolicy {
    /// Create a fresh policy for one record.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Record a failed attempt and return how long to sleep before the
    /// next one.
    ///
    /// Returns `None` once attempts are exhausted; the caller surfaces the
    /// failure instead of sleeping.
    #[must_use]
    pub fn delay_after_failure(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.config.max_attempts {
            return None;
        }
        let secs = self.config.backoff_base_secs.saturating_pow(self.attempt);
        Some(Duration::from_secs(secs))
    }

    /// Number of the attempt currently in flight (1-based).
    #[must_use]
    pub const fn current_attempt(&self) -> u32 {
        self.attempt + 1
    }

    /// Check whether another attempt is allowed.
    #[must_use]
    pub const fn exhausted(&self) -> bool {
        self.attempt >= self.config.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff_base_secs, 2);
    }

    #[test]
    fn delays_follow_base_to_the_attempt() {
        let mut policy = BackoffPolicy::new(RetryConfig::default());
        assert_eq!(policy.current_attempt(), 1);

        // Attempt 1 fails: sleep 2^1 = 2s.
        assert_eq!(policy.delay_after_failure(), Some(Duration::from_secs(2)));
        assert_eq!(policy.current_attempt(), 2);

        // Attempt 2 fails: sleep 2^2 = 4s.
        assert_eq!(policy.delay_after_failure(), Some(Duration::from_secs(4)));
        assert_eq!(policy.current_attempt(), 3);

        // Attempt 3 fails: exhausted, no sleep.
        assert_eq!(policy.delay_after_failure(), None);
        assert!(policy.exhausted());
    }

    #[test]
    fn single_attempt_config_never_sleeps() {
        let mut policy = BackoffPolicy::new(RetryConfig {
            max_attempts: 1,
            backoff_base_secs: 2,
        });
        assert_eq!(policy.delay_after_failure(), None);
        assert!(policy.exhausted());
    }

    #[test]
    fn custom_base_scales_delays() {
        let mut policy = BackoffPolicy::new(RetryConfig {
            max_attempts: 4,
            backoff_base_secs: 3,
        });
        assert_eq!(policy.delay_after_failure(), Some(Duration::from_secs(3)));
        assert_eq!(policy.delay_after_failure(), Some(Duration::from_secs(9)));
        assert_eq!(policy.delay_after_failure(), Some(Duration::from_secs(27)));
        assert_eq!(policy.delay_after_failure(), None);
    }
}
