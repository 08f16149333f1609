//! Upgrades
//!
//! Pickups dropped by destroyed boxes. Each kind is a one-shot stat change
//! applied by the pure [`apply_upgrade`].

use serde::{Serialize, Deserialize};

use crate::core::rng::RandomSource;

/// Kind of upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum UpgradeKind {
    /// +1 movement speed (tiles/second)
    SpeedBoost = 0,
    /// +1 simultaneous charge
    ExtraCharge = 1,
    /// +1 blast range
    BlastRange = 2,
}

impl UpgradeKind {
    /// All kinds, in drop-table order.
    pub const ALL: [UpgradeKind; 3] = [
        UpgradeKind::SpeedBoost,
        UpgradeKind::ExtraCharge,
        UpgradeKind::BlastRange,
    ];

    /// Pick a kind uniformly at random.
    pub fn random(rng: &mut dyn RandomSource) -> Self {
        Self::ALL[rng.next_index(Self::ALL.len())]
    }
}

/// An upgrade lying on a tile, waiting to be collected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrade {
    /// Tile column
    pub x: i32,
    /// Tile row
    pub y: i32,
    /// What it grants
    pub kind: UpgradeKind,
}

/// Per-actor stat block.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Movement speed (tiles/second)
    pub speed: f64,
    /// Maximum simultaneously armed charges
    pub max_charges: u32,
    /// Blast range of newly placed charges (tiles)
    pub blast_range: u32,
}

/// Apply one upgrade to a stat block.
pub fn apply_upgrade(stats: Stats, kind: UpgradeKind) -> Stats {
    match kind {
        UpgradeKind::SpeedBoost => Stats {
            speed: stats.speed + 1.0,
            ..stats
        },
        UpgradeKind::ExtraCharge => Stats {
            max_charges: stats.max_charges.saturating_add(1),
            ..stats
        },
        UpgradeKind::BlastRange => Stats {
            blast_range: stats.blast_range.saturating_add(1),
            ..stats
        },
    }
}
