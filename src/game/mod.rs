//! Game Logic Module
//!
//! The simulation core. Performs no I/O.
//!
//! ## Module Structure
//!
//! - `arena`: Tile grid, spawn points, upgrade drops
//! - `actor`: Movable bodies and three-phase collision resolution
//! - `collision`: Occupancy predicates
//! - `charge`: Fuses and detonation rasterization
//! - `explosion`: Propagating blast records
//! - `upgrade`: Upgrade kinds and stat application
//! - `settings`: Match rules and host patches
//! - `input`: Movement intents
//! - `events`: Per-tick events
//! - `simulation`: Authoritative tick orchestrator
//! - `snapshot`: Serializable state views

pub mod arena;
pub mod actor;
pub mod collision;
pub mod charge;
pub mod explosion;
pub mod upgrade;
pub mod settings;
pub mod input;
pub mod events;
pub mod simulation;
pub mod snapshot;
pub mod error;

// Re-export key types
pub use arena::{Arena, TileKind, TilePos};
pub use actor::{Actor, ActorId};
pub use charge::{Charge, ChargeId};
pub use explosion::Explosion;
pub use upgrade::{Upgrade, UpgradeKind, Stats};
pub use settings::{MatchSettings, SettingsPatch};
pub use input::MoveIntent;
pub use events::{GameEvent, GameEventData, DeathCause};
pub use simulation::{Simulation, Participant, MatchStatus, TickResult};
pub use snapshot::Snapshot;
pub use error::{ConfigError, MapError};
