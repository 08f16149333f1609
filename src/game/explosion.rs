//! Propagating Explosions
//!
//! The time-extended record of one detonation. Each tile activates once the
//! blast age reaches `distance * propagation_delay`; activation only ever
//! moves outward.

use serde::{Serialize, Deserialize};

use crate::game::actor::ActorId;
use crate::game::arena::TilePos;
use crate::game::charge::{BlastTile, ChargeId};

/// Default visual lifetime of an explosion.
pub const DEFAULT_EXPLOSION_DURATION_MS: f64 = 500.0;

/// Default blast travel time per tile.
pub const DEFAULT_PROPAGATION_DELAY_MS: f64 = 20.0;

/// One tile of a propagating blast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionTile {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
    /// Tiles from origin
    pub distance: u32,
    /// Blast has reached this tile
    pub activated: bool,
}

/// A blast in flight.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Explosion {
    /// Charge that produced it
    pub charge_id: ChargeId,
    /// Owner of that charge
    pub owner: ActorId,
    /// Detonation tile
    pub origin: TilePos,
    /// Affected tiles, origin first
    pub tiles: Vec<ExplosionTile>,
    /// Match clock at detonation (ms)
    pub created_at_ms: f64,
    /// Lifetime (ms)
    pub duration_ms: f64,
    /// Travel time per tile (ms)
    pub propagation_delay_ms: f64,
    /// Triggered by another blast
    pub was_chain: bool,
}

impl Explosion {
    /// Record a detonation.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        charge_id: ChargeId,
        owner: ActorId,
        origin: TilePos,
        blast: &[BlastTile],
        created_at_ms: f64,
        duration_ms: f64,
        propagation_delay_ms: f64,
        was_chain: bool,
    ) -> Self {
        let tiles = blast
            .iter()
            .map(|t| ExplosionTile {
                x: t.x,
                y: t.y,
                distance: t.distance,
                activated: false,
            })
            .collect();

        Self {
            charge_id,
            owner,
            origin,
            tiles,
            created_at_ms,
            duration_ms,
            propagation_delay_ms,
            was_chain,
        }
    }

    /// Age at match time `now_ms`.
    #[inline]
    pub fn age(&self, now_ms: f64) -> f64 {
        now_ms - self.created_at_ms
    }

    /// Match time at which the blast reaches `distance`.
    #[inline]
    pub fn reach_time(&self, distance: u32) -> f64 {
        self.created_at_ms + distance as f64 * self.propagation_delay_ms
    }

    /// Whether the visual lifetime is over.
    pub fn is_expired(&self, now_ms: f64) -> bool {
        self.age(now_ms) >= self.duration_ms
    }

    /// Activate every tile the blast has reached by `now_ms`, returning the
    /// newly activated ones with their distance.
    pub fn activate_due(&mut self, now_ms: f64) -> Vec<(TilePos, u32)> {
        let age = self.age(now_ms);
        let delay = self.propagation_delay_ms;

        self.tiles
            .iter_mut()
            .filter(|t| !t.activated && age >= t.distance as f64 * delay)
            .map(|t| {
                t.activated = true;
                (TilePos::new(t.x, t.y), t.distance)
            })
            .collect()
    }
}
