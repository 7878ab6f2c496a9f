//! Seeded randomness for director decisions

use rand::prelude::*;
use rand::rngs::StdRng;

/// Seeded random number generator for deterministic encounter simulation.
///
/// When a seed is provided (boss profile or headless config), the same seed
/// always produces the same pool picks and charge targets. Without a seed,
/// uses system entropy.
#[derive(Clone, Debug)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }

    /// Uniform index in `0..len`. Returns `None` for an empty range.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.rng.gen_range(0..len))
        }
    }

    /// Pick a uniformly random element of a slice.
    pub fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        self.index(items.len()).map(|i| items[i])
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
