//! Per-item pacing: base delay plus uniform jitter.
//!
//! Every item in a batch is scheduled this far after the previous one was
//! picked up, which keeps a single batch from hammering the generation
//! backend and staggers items from concurrent batches so they do not land
//! in lockstep.

use std::time::Duration;

use rand::Rng;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Base delay applied before every item.
pub const BASE_RATE_LIMIT_DELAY_MS: u64 = 100;

/// Lower bound (inclusive) of the random jitter added to the base delay.
pub const MIN_JITTER_MS: u64 = 20;

/// Upper bound (inclusive) of the random jitter added to the base delay.
pub const MAX_JITTER_MS: u64 = 100;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Pacing parameters for one deployment.
///
/// The defaults match the constants above; tests shrink them to keep
/// wall-clock time down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingConfig {
    pub base: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(BASE_RATE_LIMIT_DELAY_MS),
            jitter_min: Duration::from_millis(MIN_JITTER_MS),
            jitter_max: Duration::from_millis(MAX_JITTER_MS),
        }
    }
}

impl PacingConfig {
    /// Reject configs where the jitter range is inverted.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.jitter_min > self.jitter_max {
            return Err(CoreError::Validation(format!(
                "Pacing jitter range is inverted: min {}ms > max {}ms",
                self.jitter_min.as_millis(),
                self.jitter_max.as_millis(),
            )));
        }
        Ok(())
    }

    /// Compute the delay before the next item using the supplied rng.
    ///
    /// Jitter is sampled uniformly from `[jitter_min, jitter_max]` in whole
    /// milliseconds, inclusive on both ends.
    pub fn delay_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min_ms = self.jitter_min.as_millis() as u64;
        let max_ms = self.jitter_max.as_millis() as u64;
        let jitter_ms = if min_ms >= max_ms {
            min_ms
        } else {
            rng.random_range(min_ms..=max_ms)
        };
        self.base + Duration::from_millis(jitter_ms)
    }

    /// Compute the delay before the next item using the thread rng.
    pub fn delay(&self) -> Duration {
        self.delay_with(&mut rand::rng())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
