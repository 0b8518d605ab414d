//! Bounded exponential retry delay.

use std::time::Duration;

use crate::config::WorkerConfig;

/// Delay that doubles on every consecutive failure up to `max` and drops
/// back to `min` after a success.
#[derive(Debug, Clone)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    current: Duration,
}

/// Shortest delay ever returned, so a retry loop can never spin.
const MIN_DELAY: Duration = Duration::from_millis(1);

impl Backoff {
    /// Both bounds are floored at `MIN_DELAY`; `min` is capped at `max`.
    pub fn new(min: Duration, max: Duration) -> Self {
        let max = max.max(MIN_DELAY);
        let min = min.clamp(MIN_DELAY, max);
        Self {
            min,
            max,
            current: min,
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(
            Duration::from_millis(config.backoff_min_ms),
            Duration::from_millis(config.backoff_max_ms),
        )
    }

    /// Delay to wait after this failure.
    pub fn next(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.min;
    }
}
