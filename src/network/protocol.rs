//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every frame is a JSON text message tagged by `"type"`.

use serde::{Serialize, Deserialize};

use crate::game::actor::ActorId;
use crate::game::events::GameEvent;
use crate::game::settings::{MatchSettings, SettingsPatch};
use crate::game::snapshot::{ChargeView, Snapshot};
use crate::network::lobby::LobbyId;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Choose a display name.
    SetName { name: String },

    /// Request the open lobbies.
    ListLobbies,

    /// Request the available maps.
    ListMaps,

    /// Create a lobby and become its host.
    CreateLobby {
        name: String,
        #[serde(default)]
        map: Option<String>,
    },

    /// Join an existing lobby.
    JoinLobby { lobby_id: LobbyId },

    /// Leave the current lobby.
    LeaveLobby,

    /// Toggle readiness.
    SetReady { ready: bool },

    /// Host: change the map.
    SelectMap { map: String },

    /// Host: change some settings.
    UpdateSettings { settings: SettingsPatch },

    /// Host: restore default settings.
    ResetSettings,

    /// Host: remove a member.
    KickPlayer { player_id: ActorId },

    /// Host: start the match.
    StartMatch,

    /// Movement direction.
    Move { vx: f64, vy: f64 },

    /// Client-simulated position.
    ReportPosition { x: f64, y: f64 },

    /// Drop a charge on the current tile.
    PlaceCharge,

    /// Ping for latency measurement.
    Ping { timestamp: u64 },
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after the handshake.
    Connected {
        player_id: ActorId,
        server_version: String,
    },

    /// Name accepted.
    NameSet { name: String },

    /// Open lobbies.
    LobbyList { lobbies: Vec<LobbyInfo> },

    /// Available map names.
    MapList { maps: Vec<String> },

    /// Lobby membership or settings changed.
    LobbyUpdate { lobby: LobbyInfo },

    /// A charge was armed.
    ChargePlaced { charge: ChargeView },

    /// Full match state.
    State(Box<Snapshot>),

    /// Events produced by one tick.
    Events { tick: u64, events: Vec<GameEvent> },

    /// Match finished; lobby is back in setup.
    ReturnToLobby {
        lobby: LobbyInfo,
        winner: Option<ActorId>,
    },

    /// A member left (or was kicked).
    PlayerLeft {
        player_id: ActorId,
        lobby: LobbyInfo,
    },

    /// Request failed.
    Error(ServerError),

    /// Pong response.
    Pong { timestamp: u64, server_time: u64 },

    /// Server is shutting down.
    Shutdown { reason: String },
}

/// Lobby summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyInfo {
    /// Lobby id
    pub id: LobbyId,
    /// Display name
    pub name: String,
    /// Current host
    pub host: ActorId,
    /// Selected map
    pub map: String,
    /// Match settings
    pub settings: MatchSettings,
    /// Members in join order
    pub members: Vec<LobbyMemberInfo>,
    /// Member limit
    pub max_players: usize,
    /// A match is running
    pub in_match: bool,
}

/// One lobby member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyMemberInfo {
    /// Player id
    pub id: ActorId,
    /// Display name
    pub name: String,
    /// Ready to start
    pub ready: bool,
    /// Hosts the lobby
    pub is_host: bool,
}

/// Server error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ServerError {
    /// Build an error frame.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed or out-of-range input.
    InvalidInput,
    /// Settings rejected.
    InvalidSettings,
    /// Lobby does not exist.
    LobbyNotFound,
    /// Lobby is full.
    LobbyFull,
    /// Already a member of a lobby.
    AlreadyInLobby,
    /// Not a member of any lobby.
    NotInLobby,
    /// Only the host may do that.
    NotHost,
    /// A match is running.
    MatchInProgress,
    /// No match is running.
    NotInMatch,
    /// Start conditions not met.
    CannotStart,
    /// Map name unknown.
    UnknownMap,
    /// Target player unknown.
    UnknownPlayer,
    /// Too many connections.
    ServerOverloaded,
    /// Internal error.
    InternalError,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Shorthand for an error frame.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error(ServerError::new(code, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_json_roundtrip() {
        let msg = ClientMessage::Move { vx: 1.0, vy: -1.0 };

        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""type":"move""#));

        let parsed = ClientMessage::from_json(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_unit_variants_parse() {
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"place_charge"}"#).unwrap(),
            ClientMessage::PlaceCharge
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"start_match"}"#).unwrap(),
            ClientMessage::StartMatch
        );
    }

    #[test]
    fn test_create_lobby_map_optional() {
        let msg = ClientMessage::from_json(r#"{"type":"create_lobby","name":"fun"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateLobby {
                name: "fun".to_string(),
                map: None
            }
        );
    }

    #[test]
    fn test_update_settings_rejects_unknown_field() {
        let ok = ClientMessage::from_json(
            r#"{"type":"update_settings","settings":{"speed":5.0}}"#,
        )
        .unwrap();
        if let ClientMessage::UpdateSettings { settings } = ok {
            assert_eq!(settings.speed, Some(5.0));
        } else {
            panic!("Expected update_settings");
        }

        let bad = ClientMessage::from_json(
            r#"{"type":"update_settings","settings":{"gravity":9.8}}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(ClientMessage::from_json(r#"{"type":"teleport","x":1}"#).is_err());
        assert!(ClientMessage::from_json("not json").is_err());
    }

    #[test]
    fn test_server_message_json_roundtrip() {
        let id = ActorId::from_bytes([7; 16]);
        let msg = ServerMessage::Events {
            tick: 12,
            events: vec![GameEvent::actor_fell(12, id)],
        };

        let json = msg.to_json().unwrap();
        let parsed = ServerMessage::from_json(&json).unwrap();

        if let ServerMessage::Events { tick, events } = parsed {
            assert_eq!(tick, 12);
            assert_eq!(events[0].actor_id(), Some(id));
        } else {
            panic!("Expected events message");
        }
    }

    #[test]
    fn test_error_codes() {
        let msg = ServerMessage::error(ErrorCode::LobbyFull, "Lobby is full");
        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains("lobby_full"));
    }
}
