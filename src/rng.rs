// Random number sources for board generation and the random bot strategies
//
// The engine only ever needs uniform integers, so the capability is a small
// trait; which implementation backs it is chosen by configuration.

use rand::rngs::{SmallRng, StdRng};
use rand::{Rng, SeedableRng};
use serde::Deserialize;

/// Uniform integer generation, the only randomness the engine consumes
pub trait RandomSource: Send {
    /// Returns a value in `[0, bound)`. `bound` must be positive.
    fn next_index(&mut self, bound: usize) -> usize;

    /// Returns a value in `[min, max]` (both inclusive)
    fn next_range(&mut self, min: i32, max: i32) -> i32;
}

impl RandomSource for StdRng {
    fn next_index(&mut self, bound: usize) -> usize {
        self.random_range(0..bound)
    }

    fn next_range(&mut self, min: i32, max: i32) -> i32 {
        self.random_range(min..=max)
    }
}

impl RandomSource for SmallRng {
    fn next_index(&mut self, bound: usize) -> usize {
        self.random_range(0..bound)
    }

    fn next_range(&mut self, min: i32, max: i32) -> i32 {
        self.random_range(min..=max)
    }
}

/// Which generator backs the [`RandomSource`]
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RngKind {
    /// The cryptographically strong standard generator
    #[default]
    Std,
    /// A fast non-cryptographic generator
    Small,
}

/// Builds a random source of the requested kind
///
/// # Arguments
/// * `kind` - Which generator to use
/// * `seed` - Fixed seed for reproducible games, `None` seeds from OS entropy
pub fn make_rng(kind: RngKind, seed: Option<u64>) -> Box<dyn RandomSource> {
    match (kind, seed) {
        (RngKind::Std, Some(seed)) => Box::new(StdRng::seed_from_u64(seed)),
        (RngKind::Std, None) => Box::new(StdRng::from_os_rng()),
        (RngKind::Small, Some(seed)) => Box::new(SmallRng::seed_from_u64(seed)),
        (RngKind::Small, None) => Box::new(SmallRng::from_os_rng()),
    }
}
