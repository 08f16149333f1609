//! Charges
//!
//! Placed explosives. A charge counts down, then detonates once, rasterizing
//! its blast along the four axes. Only distance-0 effects resolve here; the
//! rest of the blast travels with the propagating [`Explosion`].
//!
//! [`Explosion`]: crate::game::explosion::Explosion

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::core::rng::RandomSource;
use crate::game::actor::{Actor, ActorId};
use crate::game::arena::{Arena, TileKind, TilePos};

/// Charge identifier, increasing per match.
pub type ChargeId = u32;

/// Default fuse length.
pub const DEFAULT_CHARGE_TIMER_MS: f64 = 3000.0;

/// Right, left, down, up.
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// A tile reached by a blast, with its axis distance from the origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastTile {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
    /// Tiles from origin along the arm
    pub distance: u32,
}

impl BlastTile {
    /// Tile coordinate.
    pub fn pos(&self) -> TilePos {
        TilePos::new(self.x, self.y)
    }
}

/// Output of [`Charge::detonate`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Detonation {
    /// Origin first, then each arm outward
    pub tiles: Vec<BlastTile>,
    /// Living actors standing on the origin tile
    pub instant_kills: Vec<ActorId>,
    /// Other live charges stacked on the origin tile
    pub instant_chains: Vec<ChargeId>,
}

/// An armed explosive.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Charge {
    /// Identity
    pub id: ChargeId,
    /// Tile it sits on
    pub tile: TilePos,
    /// Blast range (tiles)
    pub range: u32,
    /// Placing actor
    pub owner: ActorId,
    /// Fuse remaining (ms), may go negative
    pub timer_ms: f64,
    /// Terminal
    pub exploded: bool,
    #[serde(skip)]
    fuse_spent: bool,
}

impl Charge {
    /// Arm a new charge.
    pub fn new(id: ChargeId, tile: TilePos, range: u32, owner: ActorId, timer_ms: f64) -> Self {
        Self {
            id,
            tile,
            range,
            owner,
            timer_ms,
            exploded: false,
            fuse_spent: false,
        }
    }

    /// Burn the fuse. Returns true exactly once, on the tick it runs out.
    pub fn tick(&mut self, delta_ms: f64) -> bool {
        if self.exploded || self.fuse_spent {
            return false;
        }
        self.timer_ms -= delta_ms;
        if self.timer_ms <= 0.0 {
            self.fuse_spent = true;
            return true;
        }
        false
    }

    /// Detonate. A second call returns an empty result.
    ///
    /// Boxes hit by an arm are destroyed (possibly dropping an upgrade via
    /// `rng`) and stop that arm. Walls and holes stop an arm without being
    /// included.
    pub fn detonate(
        &mut self,
        arena: &mut Arena,
        rng: &mut dyn RandomSource,
        actors: &BTreeMap<ActorId, Actor>,
        charges: &BTreeMap<ChargeId, Charge>,
    ) -> Detonation {
        if self.exploded {
            return Detonation::default();
        }
        self.exploded = true;

        let origin = self.tile;
        let mut tiles = vec![BlastTile { x: origin.x, y: origin.y, distance: 0 }];

        for (dx, dy) in DIRECTIONS {
            for distance in 1..=self.range {
                let x = origin.x + dx * distance as i32;
                let y = origin.y + dy * distance as i32;

                match arena.tile_at(x, y) {
                    TileKind::Wall | TileKind::Hole => break,
                    TileKind::Box => {
                        tiles.push(BlastTile { x, y, distance });
                        arena.destroy_box(x, y, rng);
                        break;
                    }
                    TileKind::Empty => tiles.push(BlastTile { x, y, distance }),
                }
            }
        }

        let instant_chains = charges
            .values()
            .filter(|c| c.id != self.id && !c.exploded && c.tile == origin)
            .map(|c| c.id)
            .collect();

        let instant_kills = actors
            .values()
            .filter(|a| a.alive && a.tile() == origin)
            .map(|a| a.id)
            .collect();

        Detonation {
            tiles,
            instant_kills,
            instant_chains,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::ScriptedRandom;
    use crate::game::upgrade::Stats;
    use proptest::prelude::*;

    const STATS: Stats = Stats {
        speed: 3.0,
        max_charges: 1,
        blast_range: 2,
    };

    fn owner() -> ActorId {
        ActorId::from_bytes([7; 16])
    }

    fn charge(id: ChargeId, x: i32, y: i32, range: u32) -> Charge {
        Charge::new(id, TilePos::new(x, y), range, owner(), DEFAULT_CHARGE_TIMER_MS)
    }

    fn no_drops() -> ScriptedRandom {
        ScriptedRandom::new([0.99])
    }

    #[test]
    fn test_tick_fires_exactly_once() {
        let mut c = charge(0, 0, 0, 1);
        assert!(!c.tick(1000.0));
        assert!(!c.tick(1999.0));
        assert!(c.tick(16.0));
        assert!(!c.tick(16.0));
        assert!(!c.tick(5000.0));
    }

    #[test]
    fn test_detonate_is_idempotent() {
        let mut arena = Arena::parse(".....").unwrap();
        let mut rng = no_drops();
        let mut c = charge(0, 2, 0, 1);

        let first = c.detonate(&mut arena, &mut rng, &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(first.tiles.len(), 3);
        assert!(c.exploded);

        let second = c.detonate(&mut arena, &mut rng, &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(second, Detonation::default());
    }

    #[test]
    fn test_walls_and_holes_stop_exclusive() {
        let mut arena = Arena::parse("#..O.\n.....").unwrap();
        let mut rng = no_drops();
        let mut c = charge(0, 1, 0, 4);

        let det = c.detonate(&mut arena, &mut rng, &BTreeMap::new(), &BTreeMap::new());
        let row0: Vec<i32> = det.tiles.iter().filter(|t| t.y == 0).map(|t| t.x).collect();
        assert_eq!(row0, vec![1, 2]);
        // down arm runs off the grid after one tile
        assert!(det.tiles.contains(&BlastTile { x: 1, y: 1, distance: 1 }));
        assert_eq!(det.tiles.len(), 3);
    }

    #[test]
    fn test_box_stops_inclusive_and_is_destroyed() {
        let mut arena = Arena::parse(".....").unwrap();
        let mut arena_with_box = Arena::parse("..X..").unwrap();
        let mut rng = no_drops();

        let mut c = charge(0, 0, 0, 3);
        let det = c.detonate(&mut arena_with_box, &mut rng, &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(
            det.tiles,
            vec![
                BlastTile { x: 0, y: 0, distance: 0 },
                BlastTile { x: 1, y: 0, distance: 1 },
                BlastTile { x: 2, y: 0, distance: 2 },
            ]
        );
        assert_eq!(arena_with_box.tile_at(2, 0), TileKind::Empty);

        let mut open = charge(1, 0, 0, 3);
        let det = open.detonate(&mut arena, &mut rng, &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(det.tiles.len(), 4);
    }

    #[test]
    fn test_instant_effects_only_on_origin() {
        let mut arena = Arena::parse(".....").unwrap();
        let mut rng = no_drops();

        let on_origin = Actor::new(ActorId::from_bytes([1; 16]), "a", TilePos::new(2, 0), STATS);
        let in_arm = Actor::new(ActorId::from_bytes([2; 16]), "b", TilePos::new(3, 0), STATS);
        let mut dead = Actor::new(ActorId::from_bytes([3; 16]), "c", TilePos::new(2, 0), STATS);
        dead.kill();
        let actors: BTreeMap<_, _> = [on_origin, in_arm, dead]
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let mut charges = BTreeMap::new();
        charges.insert(5, charge(5, 2, 0, 1));
        charges.insert(6, charge(6, 3, 0, 1));
        let mut spent = charge(7, 2, 0, 1);
        spent.exploded = true;
        charges.insert(7, spent);

        let mut c = charge(4, 2, 0, 2);
        let det = c.detonate(&mut arena, &mut rng, &actors, &charges);

        assert_eq!(det.instant_kills, vec![ActorId::from_bytes([1; 16])]);
        assert_eq!(det.instant_chains, vec![5]);
    }

    proptest! {
        #[test]
        fn prop_open_field_blast_is_4r_plus_1(
            range in 1u32..6,
            x in 0i32..13,
            y in 0i32..13,
        ) {
            let text = vec![".".repeat(13); 13].join("\n");
            let mut arena = Arena::parse(&text).unwrap();
            let mut rng = ScriptedRandom::new([0.5]);
            let mut c = charge(0, x, y, range);
            let det = c.detonate(&mut arena, &mut rng, &BTreeMap::new(), &BTreeMap::new());

            // Arms are cut by the grid edge, which reads as wall.
            let reach = |toward_edge: i32| (range as i32).min(toward_edge) as usize;
            let expected = 1 + reach(12 - x) + reach(x) + reach(12 - y) + reach(y);
            prop_assert_eq!(det.tiles.len(), expected);

            for t in &det.tiles {
                let manhattan = (t.x - x).abs() + (t.y - y).abs();
                prop_assert!(t.x == x || t.y == y);
                prop_assert_eq!(t.distance as i32, manhattan);
            }
        }

        #[test]
        fn prop_unbounded_blast_is_exactly_4r_plus_1(range in 1u32..6) {
            let side = 2 * range as usize + 1;
            let text = vec![".".repeat(side); side].join("\n");
            let mut arena = Arena::parse(&text).unwrap();
            let mut rng = ScriptedRandom::new([0.5]);
            let center = range as i32;
            let mut c = charge(0, center, center, range);
            let det = c.detonate(&mut arena, &mut rng, &BTreeMap::new(), &BTreeMap::new());
            prop_assert_eq!(det.tiles.len(), 4 * range as usize + 1);
        }
    }
}
