//! Collision Detection
//!
//! Occupancy checks shared by server-side movement and client position
//! reports. A position is legal when:
//!
//! - every corner of the radius-inflated box lands on a non-solid tile,
//! - the center tile holds no live charge (unless the actor already stands
//!   on that tile),
//! - no other living actor's circle overlaps.

use crate::core::vec2::Vec2;
use crate::game::arena::{Arena, TilePos};

/// Check if two circles overlap (touching is not overlapping).
#[inline]
pub fn circles_overlap(pos_a: Vec2, radius_a: f64, pos_b: Vec2, radius_b: f64) -> bool {
    let combined = radius_a + radius_b;
    pos_a.distance_squared(pos_b) < combined * combined
}

/// Check that the square footprint around `center` touches only
/// non-solid tiles. Holes are not solid.
pub fn footprint_clear(arena: &Arena, center: Vec2, radius: f64) -> bool {
    let corners = [
        Vec2::new(center.x - radius, center.y - radius),
        Vec2::new(center.x + radius, center.y - radius),
        Vec2::new(center.x - radius, center.y + radius),
        Vec2::new(center.x + radius, center.y + radius),
    ];

    corners.iter().all(|corner| {
        let (tx, ty) = corner.tile();
        !arena.tile_at(tx, ty).is_solid()
    })
}

/// A living actor's circle, as seen by another actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Center
    pub position: Vec2,
    /// Collision radius
    pub radius: f64,
}

/// Everything a moving actor can collide with.
#[derive(Clone, Copy, Debug)]
pub struct Obstacles<'a> {
    /// Tile grid
    pub arena: &'a Arena,
    /// Other living actors (never the mover itself)
    pub bodies: &'a [Body],
    /// Tiles holding a live, unexploded charge
    pub charges: &'a [TilePos],
}

impl<'a> Obstacles<'a> {
    /// Create a collision view.
    pub fn new(arena: &'a Arena, bodies: &'a [Body], charges: &'a [TilePos]) -> Self {
        Self { arena, bodies, charges }
    }

    /// Whether a live charge sits on a tile.
    pub fn charge_at(&self, tile: TilePos) -> bool {
        self.charges.contains(&tile)
    }

    /// Whether any body overlaps a circle at `center`.
    pub fn body_overlaps(&self, center: Vec2, radius: f64) -> bool {
        self.bodies
            .iter()
            .any(|b| circles_overlap(center, radius, b.position, b.radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circles_overlap() {
        let a = Vec2::new(1.5, 1.5);
        assert!(circles_overlap(a, 0.35, Vec2::new(2.1, 1.5), 0.35));
        // exactly touching
        assert!(!circles_overlap(a, 0.5, Vec2::new(2.5, 1.5), 0.5));
        assert!(!circles_overlap(a, 0.35, Vec2::new(3.5, 1.5), 0.35));
    }

    #[test]
    fn test_footprint_against_walls_and_holes() {
        let arena = Arena::parse("#####\n#.O.#\n#####").unwrap();
        assert!(footprint_clear(&arena, Vec2::new(1.5, 1.5), 0.35));
        // centered on the hole is fine, holes are not solid
        assert!(footprint_clear(&arena, Vec2::new(2.5, 1.5), 0.35));
        // corner pokes into the top wall
        assert!(!footprint_clear(&arena, Vec2::new(1.5, 1.3), 0.35));
        // outside the grid counts as wall
        assert!(!footprint_clear(&arena, Vec2::new(-1.0, 1.5), 0.35));
    }

    #[test]
    fn test_footprint_blocked_by_box() {
        let arena = Arena::parse("..X..").unwrap();
        assert!(footprint_clear(&arena, Vec2::new(1.5, 0.5), 0.35));
        assert!(!footprint_clear(&arena, Vec2::new(1.7, 0.5), 0.35));
    }

    #[test]
    fn test_obstacles_queries() {
        let arena = Arena::parse("....").unwrap();
        let bodies = [Body { position: Vec2::new(2.5, 0.5), radius: 0.35 }];
        let charges = [TilePos::new(0, 0)];
        let obstacles = Obstacles::new(&arena, &bodies, &charges);

        assert!(obstacles.charge_at(TilePos::new(0, 0)));
        assert!(!obstacles.charge_at(TilePos::new(1, 0)));
        assert!(obstacles.body_overlaps(Vec2::new(2.0, 0.5), 0.35));
        assert!(!obstacles.body_overlaps(Vec2::new(1.5, 0.5), 0.35));
    }
}
