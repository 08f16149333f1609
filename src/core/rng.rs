//! Random Number Sources
//!
//! The simulation never touches global randomness. Every random decision
//! (upgrade drops, upgrade kinds) goes through a [`RandomSource`], which is
//! injected when a match is created. Production matches use a seeded
//! Xorshift128+ generator; tests can replay a scripted sequence.

use std::collections::VecDeque;

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Source of randomness consumed by the simulation.
pub trait RandomSource {
    /// Uniform float in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform index in `[0, len)`. Returns 0 when `len == 0`.
    fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }

    /// Bernoulli trial with the given probability of `true`.
    fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }
}

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// Given the same seed, this RNG produces the exact same sequence of
/// values on any platform.
///
/// # Example
///
/// ```
/// use blast_arena::core::rng::DeterministicRng;
///
/// let mut rng = DeterministicRng::new(12345);
/// let value = rng.next_u64();
/// assert_eq!(value, 6233086606872742541); // Always the same!
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but acceptable
        (self.next_u64() % max as u64) as u32
    }
}

impl RandomSource for DeterministicRng {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        // 53 high bits -> [0, 1)
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    #[inline]
    fn next_index(&mut self, len: usize) -> usize {
        self.next_int(len.min(u32::MAX as usize) as u32) as usize
    }
}

/// Replays a fixed sequence of floats, cycling when exhausted.
///
/// An empty script always yields `0.0`.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRandom {
    values: VecDeque<f64>,
}

impl ScriptedRandom {
    /// Create a source that yields `values` in order.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        match self.values.pop_front() {
            Some(value) => {
                self.values.push_back(value);
                value
            }
            None => 0.0,
        }
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a match seed from the lobby, its roster and a salt.
///
/// `actor_ids` should be in a stable order; lobbies pass their roster in
/// join order. The salt is usually the start time so that rematches in the
/// same lobby roll different drops.
pub fn derive_match_seed(
    lobby_id: &[u8; 16],
    actor_ids: &[[u8; 16]],
    salt: u64,
) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"BLAST_ARENA_SEED_V1");
    hasher.update(lobby_id);
    for id in actor_ids {
        hasher.update(id);
    }
    hasher.update(salt.to_le_bytes());

    let hash = hasher.finalize();

    // Take first 8 bytes as seed
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(seed)
}

// =============================================================================
// TESTS
// =============================================================================
