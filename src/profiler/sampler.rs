// Per-statement sampling decision: one uniform draw in [0, 1) against the configured frequency.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

#[derive(Debug)]
pub struct Sampler {
    frequency: f64,
    rng: Mutex<StdRng>,
}

impl Sampler {
    /// Sampler seeded from OS entropy. `frequency` is clamped to [0, 1]; NaN samples nothing.
    pub fn new(frequency: f64) -> Self {
        Self::with_rng(frequency, StdRng::from_entropy())
    }

    /// Reproducible sampler: the same seed yields the same sequence of decisions.
    pub fn seeded(frequency: f64, seed: u64) -> Self {
        Self::with_rng(frequency, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(frequency: f64, rng: StdRng) -> Self {
        let frequency = if frequency.is_nan() {
            0.0
        } else {
            frequency.clamp(0.0, 1.0)
        };
        Self {
            frequency,
            rng: Mutex::new(rng),
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// True when this statement should be logged.
    pub fn should_sample(&self) -> bool {
        let draw: f64 = match self.rng.lock() {
            Ok(mut rng) => rng.r#gen(),
            Err(poisoned) => poisoned.into_inner().r#gen(),
        };
        draw < self.frequency
    }
}
