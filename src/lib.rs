//! # Blast Arena Game Server
//!
//! Authoritative real-time simulation for a multiplayer bomb arena.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    BLAST ARENA SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Primitives                               │
//! │  ├── vec2.rs      - 2D vector in tile units                  │
//! │  ├── rng.rs       - Injectable random source                 │
//! │  └── hash.rs      - State hashing for snapshots              │
//! │                                                              │
//! │  game/            - Simulation (no I/O)                      │
//! │  ├── arena.rs     - Tile grid, spawns, upgrade drops         │
//! │  ├── actor.rs     - Movement and collision resolution        │
//! │  ├── charge.rs    - Fuses and blast rasterization            │
//! │  ├── explosion.rs - Propagating blasts                       │
//! │  └── simulation.rs- Authoritative tick orchestrator          │
//! │                                                              │
//! │  network/         - Transport (non-deterministic)            │
//! │  ├── server.rs    - WebSocket server, match loops            │
//! │  ├── lobby.rs     - Lobbies and readiness                    │
//! │  ├── maps.rs      - Map catalog                              │
//! │  └── protocol.rs  - Message types                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//!
//! Each running match is owned by exactly one task. Connections never
//! touch a `Simulation`; they queue intents which the match task applies
//! at the start of its next tick. Given the same seed, intents and tick
//! durations, a match replays identically.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::rng::{DeterministicRng, RandomSource};
pub use game::{Simulation, Participant, MatchSettings, MoveIntent, ActorId, TickResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
