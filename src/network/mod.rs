//! Network Layer
//!
//! WebSocket transport, lobbies and per-match tick loops.
//! This layer is **non-deterministic** - all game logic runs through `game/`.

pub mod protocol;
pub mod maps;
pub mod lobby;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage, LobbyInfo, ErrorCode};
pub use maps::MapCatalog;
pub use lobby::{Lobby, LobbyId, LobbyConfig, LobbyError, LobbyManager, MatchCommand};
pub use server::{GameServer, ServerConfig, GameServerError};
