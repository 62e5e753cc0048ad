//! Backoff policy for one retry tier
//!
//! Delays grow exponentially from the initial wait, are capped at the maximum
//! delay and receive a random extra share of up to `jitter_ratio` of the
//! capped value.

use crate::shared::config::RetryTierConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter_ratio: f64,
}

impl From<&RetryTierConfig> for RetryPolicy {
    fn from(config: &RetryTierConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
            jitter_ratio: config.jitter_ratio,
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry (1-based), without jitter
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let millis =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay before the given retry, honouring a server hint when present
    pub fn calculate_delay(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        // Retry-After replaces the computed backoff
        let base = match retry_after {
            Some(server_delay) => server_delay.min(self.max_delay),
            None => self.backoff(retry),
        };

        let jitter_ms = (base.as_millis() as f64 * self.jitter_ratio * rand::random::<f64>()) as u64;
        base + Duration::from_millis(jitter_ms)
    }

    /// Inclusive range every jittered delay for `retry` falls into
    pub fn delay_envelope(&self, retry: u32) -> (Duration, Duration) {
        let base = self.backoff(retry);
        let max_jitter = (base.as_millis() as f64 * self.jitter_ratio) as u64;
        (base, base + Duration::from_millis(max_jitter))
    }

    pub fn allows(&self, retries_so_far: u32) -> bool {
        retries_so_far < self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1_000),
            backoff_multiplier: 2.0,
            jitter_ratio: 0.1,
        }
    }

    #[test]
    fn test_backoff_grows_exponentially_and_caps() {
        let policy = policy();
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(10), Duration::from_millis(1_000));
    }

    #[test]
    fn test_jittered_delay_stays_in_envelope() {
        let policy = policy();
        for retry in 1..=5 {
            let (low, high) = policy.delay_envelope(retry);
            for _ in 0..50 {
                let delay = policy.calculate_delay(retry, None);
                assert!(delay >= low && delay <= high, "{:?} not in {:?}..={:?}", delay, low, high);
            }
        }
    }

    #[test]
    fn test_retry_after_is_honoured_but_capped() {
        let policy = RetryPolicy {
            jitter_ratio: 0.0,
            ..policy()
        };
        assert_eq!(
            policy.calculate_delay(1, Some(Duration::from_millis(700))),
            Duration::from_millis(700)
        );
        assert_eq!(
            policy.calculate_delay(1, Some(Duration::from_secs(30))),
            Duration::from_millis(1_000)
        );
    }

    #[test]
    fn test_retry_budget() {
        let policy = policy();
        assert!(policy.allows(0));
        assert!(policy.allows(2));
        assert!(!policy.allows(3));
    }

    #[test]
    fn test_built_from_tier_config() {
        let policy = RetryPolicy::from(&RetryTierConfig::rate_limited());
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay, Duration::from_secs(2));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
    }
}
