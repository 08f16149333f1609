//! Actors
//!
//! Player-controlled bodies with continuous position and velocity.
//!
//! Movement resolves in three phases, each validated by [`Actor::can_occupy`]:
//!
//! 1. the full diagonal step,
//! 2. each axis on its own (x first, then y from the updated x),
//! 3. corner assist: a fully stalled actor close to a cell center is nudged
//!    toward it along the perpendicular axis, so it can slip into a lane
//!    instead of catching on a corner.

use std::fmt;

use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::core::vec2::Vec2;
use crate::game::arena::{Arena, TilePos, TileKind};
use crate::game::collision::{footprint_clear, Obstacles};
use crate::game::upgrade::{self, Stats, UpgradeKind};

/// Collision radius of every actor (tiles).
pub const ACTOR_RADIUS: f64 = 0.35;

/// Max offset from the cell center at which corner assist engages.
pub const CORNER_ASSIST_THRESHOLD: f64 = 0.4;

/// Offsets at or below this are treated as already centered.
pub const CORNER_ASSIST_MIN_OFFSET: f64 = 0.01;

/// Nudge speed as a fraction of movement speed.
pub const CORNER_ASSIST_SPEED_FACTOR: f64 = 0.6;

// =============================================================================
// ACTOR ID
// =============================================================================

/// Unique actor identifier.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub Uuid);

impl ActorId {
    /// Generate a fresh random id.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ACTOR
// =============================================================================

/// A movable player entity.
#[derive(Clone, Debug)]
pub struct Actor {
    /// Identity
    pub id: ActorId,
    /// Display name
    pub name: String,
    /// Center, in tile units
    pub position: Vec2,
    /// Tiles/second
    pub velocity: Vec2,
    /// Collision radius
    pub radius: f64,
    /// Dead actors stay in the roster until the match ends
    pub alive: bool,
    /// Speed / charge cap / blast range
    pub stats: Stats,
    /// Own charges currently armed
    pub active_charges: u32,

    /// A validated client position was committed this tick.
    pub(crate) client_authoritative: bool,
    /// Latest velocity intent not yet consumed.
    pub(crate) pending_velocity: Option<Vec2>,
    /// Latest client position report not yet consumed.
    pub(crate) pending_report: Option<Vec2>,
}

impl Actor {
    /// Create an actor centered on a spawn tile.
    pub fn new(id: ActorId, name: impl Into<String>, spawn: TilePos, stats: Stats) -> Self {
        Self {
            id,
            name: name.into(),
            position: Vec2::tile_center(spawn.x, spawn.y),
            velocity: Vec2::ZERO,
            radius: ACTOR_RADIUS,
            alive: true,
            stats,
            active_charges: 0,
            client_authoritative: false,
            pending_velocity: None,
            pending_report: None,
        }
    }

    /// Tile under the actor's center.
    pub fn tile(&self) -> TilePos {
        let (x, y) = self.position.tile();
        TilePos::new(x, y)
    }

    /// Set velocity from a direction. The input is normalized (zero stays
    /// zero) and scaled by current speed.
    pub fn set_velocity_intent(&mut self, direction: Vec2) {
        self.velocity = direction.normalize().scale(self.stats.speed);
    }

    /// Whether this actor may stand at `pos`.
    pub fn can_occupy(&self, pos: Vec2, obstacles: &Obstacles<'_>) -> bool {
        if !pos.is_finite() || !footprint_clear(obstacles.arena, pos, self.radius) {
            return false;
        }

        let (tx, ty) = pos.tile();
        let dest = TilePos::new(tx, ty);
        if obstacles.charge_at(dest) && dest != self.tile() {
            return false;
        }

        !obstacles.body_overlaps(pos, self.radius)
    }

    /// Whether every point on the straight path to `to` may be occupied.
    ///
    /// The path is sampled in steps no longer than the radius, so no wall,
    /// armed charge or body can be skipped over.
    pub fn path_clear(&self, to: Vec2, obstacles: &Obstacles<'_>) -> bool {
        if !to.is_finite() {
            return false;
        }
        let delta = to - self.position;
        let steps = substeps(delta.length(), self.radius);
        (1..=steps).all(|i| {
            let t = i as f64 / steps as f64;
            self.can_occupy(self.position + delta.scale(t), obstacles)
        })
    }

    /// Integrate velocity over `dt` seconds. Returns whether the actor moved.
    ///
    /// Long deltas are split so that no single step exceeds the radius.
    pub fn advance(&mut self, dt: f64, obstacles: &Obstacles<'_>) -> bool {
        if !self.alive || self.velocity.is_zero() || dt <= 0.0 || !dt.is_finite() {
            return false;
        }

        let steps = substeps(self.velocity.length() * dt, self.radius);
        let sub_dt = dt / steps as f64;
        let mut moved = false;
        for _ in 0..steps {
            if !self.advance_step(sub_dt, obstacles) {
                break;
            }
            moved = true;
        }
        moved
    }

    fn advance_step(&mut self, dt: f64, obstacles: &Obstacles<'_>) -> bool {
        let step = self.velocity.scale(dt);
        let candidate = self.position + step;

        // Phase 1: full step
        if self.can_occupy(candidate, obstacles) {
            self.position = candidate;
            return true;
        }

        // Phase 2: axis slide
        let mut moved = false;
        if step.x != 0.0 {
            let along_x = Vec2::new(candidate.x, self.position.y);
            if self.can_occupy(along_x, obstacles) {
                self.position = along_x;
                moved = true;
            }
        }
        if step.y != 0.0 {
            let along_y = Vec2::new(self.position.x, candidate.y);
            if self.can_occupy(along_y, obstacles) {
                self.position = along_y;
                moved = true;
            }
        }
        if moved {
            return true;
        }

        // Phase 3: corner assist
        self.corner_assist(dt, obstacles)
    }

    fn corner_assist(&mut self, dt: f64, obstacles: &Obstacles<'_>) -> bool {
        let max_nudge = self.stats.speed * CORNER_ASSIST_SPEED_FACTOR * dt;
        let pos = self.position;

        // Blocked along x: nudge y toward the row center.
        if self.velocity.x != 0.0 {
            if let Some(nudge) = assist_nudge(pos.y.floor() + 0.5 - pos.y, max_nudge) {
                let y = pos.y + nudge;
                let candidates = [Vec2::new(pos.x + self.velocity.x * dt, y), Vec2::new(pos.x, y)];
                if self.try_commit(&candidates, obstacles) {
                    return true;
                }
            }
        }

        // Blocked along y: nudge x toward the column center.
        if self.velocity.y != 0.0 {
            if let Some(nudge) = assist_nudge(pos.x.floor() + 0.5 - pos.x, max_nudge) {
                let x = pos.x + nudge;
                let candidates = [Vec2::new(x, pos.y + self.velocity.y * dt), Vec2::new(x, pos.y)];
                if self.try_commit(&candidates, obstacles) {
                    return true;
                }
            }
        }

        false
    }

    fn try_commit(&mut self, candidates: &[Vec2], obstacles: &Obstacles<'_>) -> bool {
        match candidates.iter().find(|c| self.can_occupy(**c, obstacles)) {
            Some(&pos) => {
                self.position = pos;
                true
            }
            None => false,
        }
    }

    /// True iff the tile under the center is a hole.
    pub fn is_on_hole(&self, arena: &Arena) -> bool {
        let tile = self.tile();
        arena.tile_at(tile.x, tile.y) == TileKind::Hole
    }

    /// Alive and below the charge cap.
    pub fn can_place_charge(&self) -> bool {
        self.alive && self.active_charges < self.stats.max_charges
    }

    /// Apply a collected upgrade. A speed boost rescales current velocity.
    pub fn apply_upgrade(&mut self, kind: UpgradeKind) {
        self.stats = upgrade::apply_upgrade(self.stats, kind);
        if kind == UpgradeKind::SpeedBoost && !self.velocity.is_zero() {
            self.velocity = self.velocity.normalize().scale(self.stats.speed);
        }
    }

    /// Mark dead. Idempotent.
    pub fn kill(&mut self) {
        self.alive = false;
        self.velocity = Vec2::ZERO;
        self.pending_velocity = None;
        self.pending_report = None;
    }
}

/// Number of pieces needed to cover `distance` in steps of at most `max_step`.
fn substeps(distance: f64, max_step: f64) -> u32 {
    if distance <= max_step || max_step <= 0.0 {
        return 1;
    }
    (distance / max_step).ceil().min(u32::MAX as f64) as u32
}

/// Signed nudge toward the center, or None outside the assist window.
fn assist_nudge(offset: f64, max_nudge: f64) -> Option<f64> {
    let magnitude = offset.abs();
    if magnitude <= CORNER_ASSIST_MIN_OFFSET || magnitude > CORNER_ASSIST_THRESHOLD {
        return None;
    }
    Some(max_nudge.min(magnitude).copysign(offset))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::collision::Body;

    const STATS: Stats = Stats {
        speed: 3.0,
        max_charges: 1,
        blast_range: 2,
    };

    const DT: f64 = 0.05;

    fn actor_at(x: f64, y: f64) -> Actor {
        let mut actor = Actor::new(ActorId::from_bytes([1; 16]), "a", TilePos::new(0, 0), STATS);
        actor.position = Vec2::new(x, y);
        actor
    }

    #[test]
    fn test_velocity_intent_normalizes_and_scales() {
        let mut actor = actor_at(1.5, 1.5);
        actor.set_velocity_intent(Vec2::new(3.0, 4.0));
        assert!((actor.velocity.x - 1.8).abs() < 1e-9);
        assert!((actor.velocity.y - 2.4).abs() < 1e-9);

        actor.set_velocity_intent(Vec2::ZERO);
        assert!(actor.velocity.is_zero());
    }

    #[test]
    fn test_spawns_at_tile_center() {
        let actor = Actor::new(ActorId::new_v4(), "a", TilePos::new(3, 2), STATS);
        assert_eq!(actor.position, Vec2::new(3.5, 2.5));
        assert_eq!(actor.tile(), TilePos::new(3, 2));
    }

    #[test]
    fn test_advance_free_move() {
        let arena = Arena::parse(".....\n.....").unwrap();
        let obstacles = Obstacles::new(&arena, &[], &[]);
        let mut actor = actor_at(1.5, 0.5);
        actor.set_velocity_intent(Vec2::new(1.0, 0.0));

        assert!(actor.advance(DT, &obstacles));
        assert!((actor.position.x - 1.65).abs() < 1e-9);
        assert_eq!(actor.position.y, 0.5);
    }

    #[test]
    fn test_long_step_stops_at_wall() {
        let arena = Arena::parse("..#....").unwrap();
        let obstacles = Obstacles::new(&arena, &[], &[]);
        let mut actor = actor_at(0.5, 0.5);
        actor.set_velocity_intent(Vec2::new(1.0, 0.0));

        assert!(actor.advance(1.0, &obstacles));
        assert!(actor.position.x <= 2.0 - ACTOR_RADIUS + 1e-9);
        assert_eq!(actor.tile(), TilePos::new(1, 0));
    }

    #[test]
    fn test_path_clear_checks_every_step() {
        let arena = Arena::parse("....").unwrap();
        let charges = [TilePos::new(1, 0)];
        let obstacles = Obstacles::new(&arena, &[], &charges);
        let actor = actor_at(0.95, 0.5);

        assert!(actor.can_occupy(Vec2::new(2.4, 0.5), &obstacles));
        assert!(!actor.path_clear(Vec2::new(2.4, 0.5), &obstacles));
        assert!(actor.path_clear(Vec2::new(0.6, 0.5), &obstacles));

        let open = Obstacles::new(&arena, &[], &[]);
        assert!(actor.path_clear(Vec2::new(2.4, 0.5), &open));
    }

    #[test]
    fn test_zero_velocity_is_noop() {
        let arena = Arena::parse("...").unwrap();
        let obstacles = Obstacles::new(&arena, &[], &[]);
        let mut actor = actor_at(1.5, 0.5);
        assert!(!actor.advance(DT, &obstacles));
        assert_eq!(actor.position, Vec2::new(1.5, 0.5));
    }

    #[test]
    fn test_diagonal_slides_along_wall() {
        let arena = Arena::parse("#####\n#...#\n#...#\n#####").unwrap();
        let obstacles = Obstacles::new(&arena, &[], &[]);
        // Flush against the top wall, pushing up-right.
        let mut actor = actor_at(1.5, 1.35);
        actor.set_velocity_intent(Vec2::new(1.0, -1.0));

        assert!(actor.advance(DT, &obstacles));
        assert!(actor.position.x > 1.5);
        assert_eq!(actor.position.y, 1.35);
    }

    #[test]
    fn test_corner_assist_slips_into_gap() {
        let arena = Arena::parse("#####\n#...#\n##.##\n#####").unwrap();
        let obstacles = Obstacles::new(&arena, &[], &[]);
        // Slightly left of the gap's column, pushing down.
        let mut actor = actor_at(2.3, 1.5);
        actor.set_velocity_intent(Vec2::new(0.0, 1.0));

        assert!(actor.advance(DT, &obstacles));
        assert!(actor.position.x > 2.3 && actor.position.x <= 2.5);
        assert!(actor.position.y > 1.5);
    }

    #[test]
    fn test_corner_assist_ignores_far_offsets() {
        assert_eq!(assist_nudge(0.005, 0.1), None);
        assert_eq!(assist_nudge(0.45, 0.1), None);
        assert_eq!(assist_nudge(-0.2, 0.1), Some(-0.1));
        assert_eq!(assist_nudge(0.05, 0.1), Some(0.05));
    }

    #[test]
    fn test_cannot_walk_onto_charge_but_can_walk_off() {
        let arena = Arena::parse("....").unwrap();
        let charges = [TilePos::new(1, 0)];
        let obstacles = Obstacles::new(&arena, &[], &charges);

        let outside = actor_at(0.5, 0.5);
        assert!(!outside.can_occupy(Vec2::new(1.5, 0.5), &obstacles));

        let standing_on = actor_at(1.5, 0.5);
        assert!(standing_on.can_occupy(Vec2::new(1.6, 0.5), &obstacles));
        assert!(standing_on.can_occupy(Vec2::new(2.5, 0.5), &obstacles));
    }

    #[test]
    fn test_blocked_by_other_body() {
        let arena = Arena::parse(".....").unwrap();
        let bodies = [Body { position: Vec2::new(2.5, 0.5), radius: ACTOR_RADIUS }];
        let obstacles = Obstacles::new(&arena, &bodies, &[]);
        let actor = actor_at(1.5, 0.5);

        assert!(actor.can_occupy(Vec2::new(1.8, 0.5), &obstacles));
        assert!(!actor.can_occupy(Vec2::new(1.9, 0.5), &obstacles));
    }

    #[test]
    fn test_rejects_non_finite_positions() {
        let arena = Arena::parse("...").unwrap();
        let obstacles = Obstacles::new(&arena, &[], &[]);
        let actor = actor_at(1.5, 0.5);
        assert!(!actor.can_occupy(Vec2::new(f64::NAN, 0.5), &obstacles));
    }

    #[test]
    fn test_hole_detection() {
        let arena = Arena::parse(".O.").unwrap();
        assert!(actor_at(1.5, 0.5).is_on_hole(&arena));
        assert!(!actor_at(0.5, 0.5).is_on_hole(&arena));
    }

    #[test]
    fn test_charge_capacity_and_kill() {
        let mut actor = actor_at(0.5, 0.5);
        assert!(actor.can_place_charge());
        actor.active_charges = 1;
        assert!(!actor.can_place_charge());

        actor.apply_upgrade(UpgradeKind::ExtraCharge);
        assert!(actor.can_place_charge());

        actor.kill();
        actor.kill();
        assert!(!actor.alive);
        assert!(!actor.can_place_charge());
    }

    #[test]
    fn test_speed_boost_rescales_velocity() {
        let mut actor = actor_at(0.5, 0.5);
        actor.set_velocity_intent(Vec2::new(1.0, 0.0));
        actor.apply_upgrade(UpgradeKind::SpeedBoost);
        assert_eq!(actor.stats.speed, 4.0);
        assert!((actor.velocity.x - 4.0).abs() < 1e-9);
    }
}
