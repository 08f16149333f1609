//! Core primitives.
//!
//! Simulation-independent building blocks: vector math, injectable
//! randomness and state hashing.

pub mod vec2;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rng::{RandomSource, DeterministicRng, ScriptedRandom};
pub use hash::compute_state_hash;
