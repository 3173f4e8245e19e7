//! Random number generator abstraction for determinism.
//!
//! Town identifiers and update passwords are drawn through this trait so
//! tests can inject a seeded or scripted implementation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Abstraction over random number generation.
pub trait DeterministicRng: Send + Sync {
    /// Generate a random `u32` in the range `[min, max]` inclusive.
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32;
}

/// Production RNG seeded from the operating system.
#[derive(Debug)]
pub struct SystemRng(StdRng);

impl SystemRng {
    /// Creates an RNG seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self(StdRng::from_os_rng())
    }
}

impl Default for SystemRng {
    fn default() -> Self {
        Self::new()
    }
}

impl DeterministicRng for SystemRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        self.0.random_range(min..=max)
    }
}

/// Draws `len` characters uniformly from `alphabet`.
///
/// Out-of-range values from a scripted RNG are clamped to the last character.
#[must_use]
pub fn random_string(rng: &mut dyn DeterministicRng, alphabet: &str, len: usize) -> String {
    let chars: Vec<char> = alphabet.chars().collect();
    let Some(last) = chars.len().checked_sub(1) else {
        return String::new();
    };
    let max = u32::try_from(last).unwrap_or(u32::MAX);
    (0..len)
        .map(|_| {
            let index = usize::try_from(rng.next_u32_range(0, max)).unwrap_or(last);
            chars[index.min(last)]
        })
        .collect()
}
