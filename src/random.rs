//! Injectable randomness for the simulation steps
//!
//! Temperature jitter, the diurnal range and the heuristic UHI noise all draw
//! from a [`RandomSource`], so tests can replay exact sequences.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

/// Source of uniformly distributed floats
pub trait RandomSource: Send + Sync {
    /// Draw a value in `[low, high)`. Returns `low` for an empty range.
    fn uniform(&self, low: f64, high: f64) -> f64;
}

/// Thread-local RNG, the production default
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn uniform(&self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        rand::rng().random_range(low..high)
    }
}

/// Seeded RNG for reproducible runs
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random_range(low..high)
    }
}

/// Replays a fixed script of unit fractions, cycling when exhausted.
///
/// Each fraction `u` in `[0, 1)` maps to `low + u * (high - low)`.
#[derive(Debug)]
pub struct ScriptedRandom {
    fractions: Vec<f64>,
    cursor: AtomicUsize,
}

impl ScriptedRandom {
    /// Fractions are clamped into `[0, 1)`; an empty script behaves like `[0.0]`.
    #[must_use]
    pub fn new(fractions: Vec<f64>) -> Self {
        let fractions = if fractions.is_empty() {
            vec![0.0]
        } else {
            fractions
                .into_iter()
                .map(|u| u.clamp(0.0, 1.0 - f64::EPSILON))
                .collect()
        };
        Self {
            fractions,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Always returns the same fraction
    #[must_use]
    pub fn constant(fraction: f64) -> Self {
        Self::new(vec![fraction])
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.fractions.len();
        low + self.fractions[index] * (high - low)
    }
}
