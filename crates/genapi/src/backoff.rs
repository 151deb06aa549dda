//! Exponential-backoff policy for retried generation calls.
//!
//! The item processor sleeps [`RetryConfig::initial_backoff`] before the
//! first retry and grows the delay by [`RetryConfig::multiplier`] per
//! failure, clamped to [`RetryConfig::max_backoff`].

use std::time::Duration;

/// Maximum retries per item after the initial attempt.
pub const MAX_ITEM_RETRIES: u32 = 3;

/// Tunable parameters for the retry backoff strategy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt. Zero disables retries.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on the delay between retries.
    pub max_backoff: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_ITEM_RETRIES,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`RetryConfig::max_backoff`].
pub fn next_backoff(current: Duration, config: &RetryConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_backoff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_backoff_doubles() {
        let config = RetryConfig::default();
        let d = next_backoff(Duration::from_millis(250), &config);
        assert_eq!(d, Duration::from_millis(500));
    }

    #[test]
    fn next_backoff_clamps_at_max() {
        let config = RetryConfig::default();
        let d = next_backoff(Duration::from_secs(4), &config);
        assert_eq!(d, Duration::from_secs(5));
    }

    #[test]
    fn next_backoff_already_at_max() {
        let config = RetryConfig::default();
        let d = next_backoff(Duration::from_secs(5), &config);
        assert_eq!(d, Duration::from_secs(5));
    }

    #[test]
    fn custom_multiplier() {
        let config = RetryConfig {
            multiplier: 3.0,
            ..Default::default()
        };
        let d = next_backoff(Duration::from_millis(100), &config);
        assert_eq!(d, Duration::from_millis(300));
    }

    #[test]
    fn full_backoff_sequence() {
        let config = RetryConfig::default();
        let mut delay = config.initial_backoff;
        let expected_ms = [250, 500, 1000, 2000, 4000, 5000, 5000];

        for &expected in &expected_ms {
            assert_eq!(delay.as_millis() as u64, expected);
            delay = next_backoff(delay, &config);
        }
    }
}
