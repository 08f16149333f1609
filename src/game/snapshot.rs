//! State Snapshots
//!
//! Self-contained, read-only views of a match, suitable for direct
//! serialization. A fresh observer can render the match from one snapshot.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::actor::{Actor, ActorId};
use crate::game::arena::{Arena, TilePos};
use crate::game::charge::{Charge, ChargeId};
use crate::game::explosion::Explosion;
use crate::game::simulation::MatchStatus;
use crate::game::upgrade::{Stats, Upgrade};

/// Arena as glyph rows plus pending upgrades.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaView {
    /// Columns
    pub width: usize,
    /// Rows
    pub height: usize,
    /// One string per row (`.`, `#`, `X`, `O`)
    pub rows: Vec<String>,
    /// Spawn tiles in assignment order
    pub spawn_points: Vec<TilePos>,
    /// Uncollected upgrades
    pub upgrades: Vec<Upgrade>,
}

impl From<&Arena> for ArenaView {
    fn from(arena: &Arena) -> Self {
        Self {
            width: arena.width(),
            height: arena.height(),
            rows: arena.rows(),
            spawn_points: arena.spawn_points().to_vec(),
            upgrades: arena.upgrades().to_vec(),
        }
    }
}

/// Public state of one actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorView {
    /// Actor id
    pub id: ActorId,
    /// Display name
    pub name: String,
    /// Center (tiles)
    pub position: Vec2,
    /// Velocity (tiles/second)
    pub velocity: Vec2,
    /// Still in play
    pub alive: bool,
    /// Current stats
    pub stats: Stats,
    /// Charges armed and not yet exploded
    pub active_charges: u32,
}

impl From<&Actor> for ActorView {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.id,
            name: actor.name.clone(),
            position: actor.position,
            velocity: actor.velocity,
            alive: actor.alive,
            stats: actor.stats,
            active_charges: actor.active_charges,
        }
    }
}

/// Public state of one armed charge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeView {
    /// Charge id
    pub id: ChargeId,
    /// Tile x
    pub x: i32,
    /// Tile y
    pub y: i32,
    /// Blast range (tiles)
    pub range: u32,
    /// Who placed it
    pub owner: ActorId,
    /// Fuse remaining (ms)
    pub timer_ms: f64,
}

impl From<&Charge> for ChargeView {
    fn from(charge: &Charge) -> Self {
        Self {
            id: charge.id,
            x: charge.tile.x,
            y: charge.tile.y,
            range: charge.range,
            owner: charge.owner,
            timer_ms: charge.timer_ms.max(0.0),
        }
    }
}

/// Full match state at one tick.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ticks advanced so far
    pub tick: u64,
    /// Wall clock when the snapshot was taken (unix ms)
    pub server_time_ms: i64,
    /// Simulation clock (ms since match start)
    pub match_time_ms: f64,
    /// Match phase
    pub status: MatchStatus,
    /// Last survivor, if any
    pub winner: Option<ActorId>,
    /// Arena tiles and upgrades
    pub arena: ArenaView,
    /// Actors by id
    pub actors: Vec<ActorView>,
    /// Armed charges
    pub charges: Vec<ChargeView>,
    /// Live explosions
    pub explosions: Vec<Explosion>,
    /// Hex SHA-256 of the simulation state
    pub state_hash: String,
}

impl Snapshot {
    /// Look up an actor by id.
    pub fn actor(&self, id: ActorId) -> Option<&ActorView> {
        self.actors.iter().find(|a| a.id == id)
    }
}
