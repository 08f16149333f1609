//! Arena Tile Grid
//!
//! The static/mutable grid a match is played on, its spawn points, and the
//! upgrades dropped by destroyed boxes.
//!
//! Map text is one row per line using the glyphs:
//!
//! ```text
//! .  empty      #  wall      X  box
//! O  hole       S  spawn (recorded, then stored as empty)
//! ```

use serde::{Serialize, Deserialize};

use crate::core::rng::RandomSource;
use crate::game::error::MapError;
use crate::game::upgrade::{Upgrade, UpgradeKind};

/// Default probability that a destroyed box drops an upgrade.
pub const DEFAULT_UPGRADE_CHANCE: f64 = 0.3;

/// Kind of a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TileKind {
    /// Walkable floor.
    Empty = 0,
    /// Indestructible, blocks movement and blasts.
    Wall = 1,
    /// Destructible, blocks movement; a blast destroys it and stops.
    Box = 2,
    /// Walkable but lethal; blocks blasts.
    Hole = 3,
}

impl TileKind {
    /// Map glyph for this tile.
    pub fn glyph(self) -> char {
        match self {
            TileKind::Empty => '.',
            TileKind::Wall => '#',
            TileKind::Box => 'X',
            TileKind::Hole => 'O',
        }
    }

    /// Whether an actor footprint may overlap this tile.
    #[inline]
    pub fn is_solid(self) -> bool {
        matches!(self, TileKind::Wall | TileKind::Box)
    }
}

/// Integer tile coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TilePos {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl TilePos {
    /// Create a new coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

const GLYPH_SPAWN: char = 'S';

/// The tile grid of one match.
#[derive(Clone, Debug)]
pub struct Arena {
    width: usize,
    height: usize,
    tiles: Vec<TileKind>,
    spawn_points: Vec<TilePos>,
    upgrades: Vec<Upgrade>,
    upgrade_chance: f64,
}

impl Arena {
    /// Parse map text.
    ///
    /// Blank lines are skipped, rows shorter than the widest row are padded
    /// with empty tiles. If no spawn glyph is present, four spawn points
    /// inset one tile from the corners are synthesized.
    pub fn parse(text: &str) -> Result<Self, MapError> {
        if text.is_empty() {
            return Err(MapError::Empty);
        }

        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect();

        if rows.is_empty() {
            return Err(MapError::NoRows);
        }

        let height = rows.len();
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);

        let mut tiles = vec![TileKind::Empty; width * height];
        let mut spawn_points = Vec::new();

        for (y, row) in rows.iter().enumerate() {
            for (x, glyph) in row.chars().enumerate() {
                let tile = match glyph {
                    '.' => TileKind::Empty,
                    '#' => TileKind::Wall,
                    'X' => TileKind::Box,
                    'O' => TileKind::Hole,
                    GLYPH_SPAWN => {
                        spawn_points.push(TilePos::new(x as i32, y as i32));
                        TileKind::Empty
                    }
                    other => {
                        return Err(MapError::InvalidGlyph {
                            glyph: other,
                            row: y,
                            column: x,
                        })
                    }
                };
                tiles[y * width + x] = tile;
            }
        }

        if spawn_points.is_empty() {
            let right = (width as i32 - 2).max(0);
            let bottom = (height as i32 - 2).max(0);
            spawn_points = vec![
                TilePos::new(1, 1),
                TilePos::new(right, 1),
                TilePos::new(1, bottom),
                TilePos::new(right, bottom),
            ];
        }

        Ok(Self {
            width,
            height,
            tiles,
            spawn_points,
            upgrades: Vec::new(),
            upgrade_chance: DEFAULT_UPGRADE_CHANCE,
        })
    }

    /// Set the probability that a destroyed box drops an upgrade.
    pub fn with_upgrade_chance(mut self, chance: f64) -> Self {
        self.upgrade_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Grid width in tiles.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in tiles.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Tile at a coordinate. Anything out of bounds is a wall.
    pub fn tile_at(&self, x: i32, y: i32) -> TileKind {
        match self.index(x, y) {
            Some(idx) => self.tiles[idx],
            None => TileKind::Wall,
        }
    }

    /// Only empty tiles are walkable.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.tile_at(x, y) == TileKind::Empty
    }

    /// Destroy a box, possibly dropping an upgrade.
    ///
    /// Returns whether a box was actually present.
    pub fn destroy_box(&mut self, x: i32, y: i32, rng: &mut dyn RandomSource) -> bool {
        let Some(idx) = self.index(x, y) else {
            return false;
        };
        if self.tiles[idx] != TileKind::Box {
            return false;
        }

        self.tiles[idx] = TileKind::Empty;

        if rng.chance(self.upgrade_chance) {
            let kind = UpgradeKind::random(rng);
            self.upgrades.push(Upgrade { x, y, kind });
            tracing::trace!(x, y, ?kind, "box dropped upgrade");
        }

        true
    }

    /// Remove and return the first upgrade lying exactly on a tile.
    pub fn take_upgrade_at(&mut self, x: i32, y: i32) -> Option<Upgrade> {
        let idx = self.upgrades.iter().position(|u| u.x == x && u.y == y)?;
        Some(self.upgrades.remove(idx))
    }

    /// Upgrades waiting to be collected.
    pub fn upgrades(&self) -> &[Upgrade] {
        &self.upgrades
    }

    /// Recorded spawn points (never empty).
    pub fn spawn_points(&self) -> &[TilePos] {
        &self.spawn_points
    }

    /// Spawn point for the n-th actor, wrapping around.
    pub fn spawn_point_at(&self, index: usize) -> TilePos {
        self.spawn_points[index % self.spawn_points.len()]
    }

    /// Rows rendered back to glyphs (spawns appear as empty).
    pub fn rows(&self) -> Vec<String> {
        self.tiles
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|t| t.glyph()).collect())
            .collect()
    }

    /// Iterate every tile in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = TileKind> + '_ {
        self.tiles.iter().copied()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }
}
