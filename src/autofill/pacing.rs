use crate::core::config::PacingConfig;
use rand::distr::{Distribution, Uniform};
use std::time::Duration;

/// Randomized pause inserted after each injection so a form does not change
/// all at once. `0..=0` disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min_ms: u64,
    max_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(150, 300)
    }
}

impl Pacing {
    /// Bounds are inclusive; a reversed pair is reordered.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn from_config(cfg: &PacingConfig) -> Self {
        Self::new(cfg.resolve_min_ms(), cfg.resolve_max_ms())
    }

    pub fn bounds(&self) -> (u64, u64) {
        (self.min_ms, self.max_ms)
    }

    pub fn sample(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        let millis = match Uniform::new_inclusive(self.min_ms, self.max_ms) {
            Ok(dist) => dist.sample(&mut rand::rng()),
            Err(_) => self.min_ms,
        };
        Duration::from_millis(millis)
    }

    pub async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
