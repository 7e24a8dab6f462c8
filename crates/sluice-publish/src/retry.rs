//! Exponential backoff schedule for publish retries.
//!
//! The schedule is doubling from a fixed base: 200ms, 400ms, 800ms before
//! retries one through three. Jitter is off by default; enabling it spreads
//! simultaneous worker retries without changing the retry count.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry schedule for a publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (3 retries = 4 total attempts).
    pub max_retries: u32,
    /// Base delay; retry `n` sleeps `2^n * base_delay`.
    pub base_delay: Duration,
    /// Jitter fraction (0.0 to 1.0) applied to each delay.
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_millis(100), jitter_factor: 0.0 }
    }
}

impl RetryPolicy {
    /// Total attempts including the initial one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay to sleep before retry `retry` (1-based).
    ///
    /// With the default policy: 200ms, 400ms, 800ms.
    pub fn delay_before(&self, retry: u32) -> Duration {
        let exponent = retry.min(20);
        let multiplier = 2_u32.saturating_pow(exponent);
        apply_jitter(self.base_delay * multiplier, self.jitter_factor)
    }
}

/// Randomizes a delay by up to `jitter_factor` in either direction.
fn apply_jitter(duration: Duration, jitter_factor: f64) -> Duration {
    if jitter_factor <= 0.0 {
        return duration;
    }

    let clamped = jitter_factor.clamp(0.0, 1.0);
    let mut rng = rand::rng();
    let range = duration.as_secs_f64() * clamped;
    let offset = rng.random_range(-range..=range);

    Duration::from_secs_f64((duration.as_secs_f64() + offset).max(0.0))
}
