//! Match Settings
//!
//! Host-tunable rules for one match. Values are validated here, before a
//! simulation exists; the simulation only ever sees complete, in-range
//! settings.

use serde::{Serialize, Deserialize};

use crate::game::charge::DEFAULT_CHARGE_TIMER_MS;
use crate::game::error::ConfigError;
use crate::game::explosion::{DEFAULT_EXPLOSION_DURATION_MS, DEFAULT_PROPAGATION_DELAY_MS};
use crate::game::arena::DEFAULT_UPGRADE_CHANCE;
use crate::game::upgrade::Stats;

/// Permitted movement speed (tiles/second).
pub const SPEED_RANGE: (f64, f64) = (1.0, 10.0);
/// Permitted starting charge count.
pub const CHARGE_COUNT_RANGE: (u32, u32) = (1, 10);
/// Permitted starting blast range.
pub const BLAST_RANGE_RANGE: (u32, u32) = (1, 10);
/// Permitted fuse length (ms).
pub const CHARGE_TIMER_RANGE: (u32, u32) = (1000, 10_000);
/// Permitted upgrade drop probability.
pub const UPGRADE_CHANCE_RANGE: (f64, f64) = (0.0, 1.0);

/// Rules for one match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    /// Starting movement speed (tiles/second)
    pub speed: f64,
    /// Starting simultaneous charges
    pub charge_count: u32,
    /// Starting blast range (tiles)
    pub blast_range: u32,
    /// Fuse length (ms)
    pub charge_timer_ms: u32,
    /// Probability a destroyed box drops an upgrade
    pub upgrade_spawn_chance: f64,
    /// Explosion lifetime (ms)
    pub explosion_duration_ms: u32,
    /// Blast travel time per tile (ms)
    pub propagation_delay_ms: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            speed: 3.0,
            charge_count: 1,
            blast_range: 2,
            charge_timer_ms: DEFAULT_CHARGE_TIMER_MS as u32,
            upgrade_spawn_chance: DEFAULT_UPGRADE_CHANCE,
            explosion_duration_ms: DEFAULT_EXPLOSION_DURATION_MS as u32,
            propagation_delay_ms: DEFAULT_PROPAGATION_DELAY_MS as u32,
        }
    }
}

impl MatchSettings {
    /// Check every value against its permitted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_f64("speed", self.speed, SPEED_RANGE)?;
        check_u32("charge_count", self.charge_count, CHARGE_COUNT_RANGE)?;
        check_u32("blast_range", self.blast_range, BLAST_RANGE_RANGE)?;
        check_u32("charge_timer_ms", self.charge_timer_ms, CHARGE_TIMER_RANGE)?;
        check_f64("upgrade_spawn_chance", self.upgrade_spawn_chance, UPGRADE_CHANCE_RANGE)?;
        check_u32("explosion_duration_ms", self.explosion_duration_ms, (1, 60_000))?;
        check_u32("propagation_delay_ms", self.propagation_delay_ms, (0, 1000))?;
        Ok(())
    }

    /// Starting stat block for every actor.
    pub fn starting_stats(&self) -> Stats {
        Stats {
            speed: self.speed,
            max_charges: self.charge_count,
            blast_range: self.blast_range,
        }
    }
}

fn check_f64(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), ConfigError> {
    // NaN fails both comparisons
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, min, max })
    }
}

fn check_u32(field: &'static str, value: u32, (min, max): (u32, u32)) -> Result<(), ConfigError> {
    check_f64(field, value as f64, (min as f64, max as f64))
}

/// Partial settings update sent by a lobby host.
///
/// Unknown fields are rejected during deserialization; any out-of-range
/// value rejects the whole patch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsPatch {
    /// New speed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// New charge count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge_count: Option<u32>,
    /// New blast range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blast_range: Option<u32>,
    /// New fuse length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge_timer_ms: Option<u32>,
    /// New drop chance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_spawn_chance: Option<f64>,
}

impl SettingsPatch {
    /// True if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply to `base`, returning the validated result.
    pub fn apply(&self, base: &MatchSettings) -> Result<MatchSettings, ConfigError> {
        let mut next = base.clone();
        if let Some(v) = self.speed {
            next.speed = v;
        }
        if let Some(v) = self.charge_count {
            next.charge_count = v;
        }
        if let Some(v) = self.blast_range {
            next.blast_range = v;
        }
        if let Some(v) = self.charge_timer_ms {
            next.charge_timer_ms = v;
        }
        if let Some(v) = self.upgrade_spawn_chance {
            next.upgrade_spawn_chance = v;
        }
        next.validate()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = MatchSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.charge_timer_ms, 3000);
        assert_eq!(settings.explosion_duration_ms, 500);
        assert_eq!(settings.propagation_delay_ms, 20);
        assert_eq!(
            settings.starting_stats(),
            Stats { speed: 3.0, max_charges: 1, blast_range: 2 }
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        let settings = MatchSettings { charge_timer_ms: 500, ..Default::default() };
        match settings.validate() {
            Err(ConfigError::OutOfRange { field, .. }) => assert_eq!(field, "charge_timer_ms"),
            other => panic!("unexpected {:?}", other),
        }

        let settings = MatchSettings { speed: f64::NAN, ..Default::default() };
        assert!(settings.validate().is_err());

        let settings = MatchSettings { upgrade_spawn_chance: 1.5, ..Default::default() };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_patch_applies_and_validates() {
        let base = MatchSettings::default();
        let patch = SettingsPatch { speed: Some(5.0), blast_range: Some(4), ..Default::default() };
        let next = patch.apply(&base).unwrap();
        assert_eq!(next.speed, 5.0);
        assert_eq!(next.blast_range, 4);
        assert_eq!(next.charge_count, base.charge_count);

        let bad = SettingsPatch { speed: Some(5.0), charge_count: Some(11), ..Default::default() };
        assert!(bad.apply(&base).is_err());
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let ok: SettingsPatch = serde_json::from_str(r#"{"speed": 4}"#).unwrap();
        assert_eq!(ok.speed, Some(4.0));
        assert!(!ok.is_empty());

        let unknown = serde_json::from_str::<SettingsPatch>(r#"{"gravity": 9.8}"#);
        assert!(unknown.is_err());
    }
}
