//! Randomness as a capability, so win/loss and P&L paths are seedable.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform draws for outcome and return generation.
pub trait RandomSource: Send {
    /// Uniform draw in `[0, 1)`.
    fn draw(&mut self) -> f64;

    /// Uniform draw in `[lo, hi]`.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.draw()
    }
}

/// Thread-local OS randomness; the production source.
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn draw(&mut self) -> f64 {
        rand::thread_rng().gen()
    }
}

/// Deterministic ChaCha8 stream for reproducible tests.
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn draw(&mut self) -> f64 {
        self.rng.gen()
    }
}
