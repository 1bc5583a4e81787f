//! # Inter-batch Backoff
//!
//! Maps the outcome of a settled batch to the pause taken before the next one.
//! A batch that saw the upstream's rate-limit signal cools down for the long
//! delay; any other batch, failed or not, only takes the short throttling pause.

use crate::config::BackoffConfig;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    short_delay: Duration,
    rate_limited_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&BackoffConfig::default())
    }
}

impl BackoffPolicy {
    pub fn new(short_delay: Duration, rate_limited_delay: Duration) -> Self {
        Self {
            short_delay,
            rate_limited_delay,
        }
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(config.short_delay(), config.rate_limited_delay())
    }

    pub fn delay(&self, rate_limited: bool) -> Duration {
        if rate_limited {
            self.rate_limited_delay
        } else {
            self.short_delay
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_delays() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(true), Duration::from_secs(10));
        assert_eq!(policy.delay(false), Duration::from_secs(1));
    }

    proptest! {
        #[test]
        fn prop_delay_only_depends_on_rate_limit_flag(short in 0u64..60_000, extra in 0u64..60_000) {
            let policy = BackoffPolicy::new(
                Duration::from_millis(short),
                Duration::from_millis(short + extra),
            );
            prop_assert_eq!(policy.delay(false), Duration::from_millis(short));
            prop_assert_eq!(policy.delay(true), Duration::from_millis(short + extra));
            prop_assert!(policy.delay(true) >= policy.delay(false));
        }
    }
}
