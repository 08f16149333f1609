//! Game Events
//!
//! Discrete happenings produced by one simulation tick, in the order they
//! occurred.

use serde::{Serialize, Deserialize};

use crate::game::actor::ActorId;
use crate::game::charge::{BlastTile, ChargeId};
use crate::game::upgrade::Upgrade;

/// Why an actor died.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeathCause {
    /// Caught in a blast
    Explosion {
        /// Charge whose blast it was
        charge_id: ChargeId,
        /// Who placed that charge
        owner: ActorId,
    },
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEventData {
    /// Actor fell into a hole
    ActorFell {
        actor_id: ActorId,
    },

    /// Actor picked up an upgrade
    UpgradeCollected {
        actor_id: ActorId,
        upgrade: Upgrade,
    },

    /// A charge detonated
    Explosion {
        charge_id: ChargeId,
        tiles: Vec<BlastTile>,
        killed_actor_ids: Vec<ActorId>,
        was_chain: bool,
    },

    /// Actor died in a blast
    ActorKilled {
        actor_id: ActorId,
        cause: DeathCause,
    },

    /// Match ended
    MatchOver {
        winner: Option<ActorId>,
    },
}

/// A game event stamped with its tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u64,

    /// Event data
    #[serde(flatten)]
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u64, data: GameEventData) -> Self {
        Self { tick, data }
    }

    /// Create actor fell event.
    pub fn actor_fell(tick: u64, actor_id: ActorId) -> Self {
        Self::new(tick, GameEventData::ActorFell { actor_id })
    }

    /// Create upgrade collected event.
    pub fn upgrade_collected(tick: u64, actor_id: ActorId, upgrade: Upgrade) -> Self {
        Self::new(tick, GameEventData::UpgradeCollected { actor_id, upgrade })
    }

    /// Create explosion event.
    pub fn explosion(
        tick: u64,
        charge_id: ChargeId,
        tiles: Vec<BlastTile>,
        killed_actor_ids: Vec<ActorId>,
        was_chain: bool,
    ) -> Self {
        Self::new(
            tick,
            GameEventData::Explosion {
                charge_id,
                tiles,
                killed_actor_ids,
                was_chain,
            },
        )
    }

    /// Create actor killed event.
    pub fn actor_killed(tick: u64, actor_id: ActorId, cause: DeathCause) -> Self {
        Self::new(tick, GameEventData::ActorKilled { actor_id, cause })
    }

    /// Create match over event.
    pub fn match_over(tick: u64, winner: Option<ActorId>) -> Self {
        Self::new(tick, GameEventData::MatchOver { winner })
    }

    /// Actor this event is about, if any.
    pub fn actor_id(&self) -> Option<ActorId> {
        match &self.data {
            GameEventData::ActorFell { actor_id }
            | GameEventData::UpgradeCollected { actor_id, .. }
            | GameEventData::ActorKilled { actor_id, .. } => Some(*actor_id),
            GameEventData::MatchOver { winner } => *winner,
            GameEventData::Explosion { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let id = ActorId::from_bytes([1; 16]);
        let event = GameEvent::actor_fell(7, id);
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["tick"], 7);
        assert_eq!(json["type"], "actor_fell");
        assert_eq!(json["actor_id"], id.0.to_string());
    }

    #[test]
    fn test_killed_cause_nested() {
        let victim = ActorId::from_bytes([2; 16]);
        let owner = ActorId::from_bytes([3; 16]);
        let event = GameEvent::actor_killed(1, victim, DeathCause::Explosion { charge_id: 4, owner });
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "actor_killed");
        assert_eq!(json["cause"]["type"], "explosion");
        assert_eq!(json["cause"]["charge_id"], 4);
        assert_eq!(event.actor_id(), Some(victim));
    }

    #[test]
    fn test_match_over_round_trip() {
        let event = GameEvent::match_over(99, None);
        let json = serde_json::to_string(&event).unwrap();
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.actor_id(), None);
    }
}
