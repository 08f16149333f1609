//! Movement Intents
//!
//! What a client may ask of its actor between ticks. Intents are buffered on
//! the actor (one per kind, last writer wins) and consumed at the start of
//! the next tick.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;

/// Largest accepted displacement for one position report (tiles).
pub const MAX_REPORT_DISTANCE: f64 = 1.5;

/// A movement request.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveIntent {
    /// Desired direction; normalized and scaled by the actor's speed.
    Velocity {
        /// X direction
        vx: f64,
        /// Y direction
        vy: f64,
    },
    /// Client-simulated position, validated before being trusted.
    Position {
        /// Reported x (tiles)
        x: f64,
        /// Reported y (tiles)
        y: f64,
    },
}

impl MoveIntent {
    /// Direction intent.
    pub fn velocity(vx: f64, vy: f64) -> Self {
        MoveIntent::Velocity { vx, vy }
    }

    /// Position report.
    pub fn position(x: f64, y: f64) -> Self {
        MoveIntent::Position { x, y }
    }

    /// Payload as a vector.
    pub fn vector(&self) -> Vec2 {
        match *self {
            MoveIntent::Velocity { vx, vy } => Vec2::new(vx, vy),
            MoveIntent::Position { x, y } => Vec2::new(x, y),
        }
    }

    /// NaN or infinite components make an intent meaningless.
    pub fn is_finite(&self) -> bool {
        self.vector().is_finite()
    }
}

/// Whether a reported position is close enough to `current` to consider.
pub fn within_report_cap(current: Vec2, reported: Vec2) -> bool {
    current.distance_squared(reported) <= MAX_REPORT_DISTANCE * MAX_REPORT_DISTANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_cap() {
        let here = Vec2::new(2.5, 2.5);
        assert!(within_report_cap(here, Vec2::new(2.6, 2.5)));
        assert!(within_report_cap(here, Vec2::new(4.0, 2.5)));
        assert!(!within_report_cap(here, Vec2::new(7.5, 2.5)));
    }

    #[test]
    fn test_non_finite_intents() {
        assert!(MoveIntent::velocity(1.0, 0.0).is_finite());
        assert!(!MoveIntent::velocity(f64::NAN, 0.0).is_finite());
        assert!(!MoveIntent::position(f64::INFINITY, 1.0).is_finite());
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&MoveIntent::position(1.5, 2.0)).unwrap();
        assert_eq!(json, r#"{"kind":"position","x":1.5,"y":2.0}"#);
    }
}
