//! Lobby Management
//!
//! Pre-match rooms: membership, readiness, host-only settings, and the
//! handle to a running match. A lobby never touches the simulation; once a
//! match starts it only forwards intents to the match task.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Deserialize};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::rng::{derive_match_seed, DeterministicRng};
use crate::game::actor::ActorId;
use crate::game::error::ConfigError;
use crate::game::input::MoveIntent;
use crate::game::settings::{MatchSettings, SettingsPatch};
use crate::game::simulation::{Participant, Simulation};
use crate::network::maps::MapCatalog;
use crate::network::protocol::{ErrorCode, LobbyInfo, LobbyMemberInfo, ServerMessage};

/// Lobby identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LobbyId(pub Uuid);

impl LobbyId {
    /// Fresh random id.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lobby size limits.
#[derive(Debug, Clone, Copy)]
pub struct LobbyConfig {
    /// Maximum members.
    pub max_players: usize,
    /// Minimum members to start.
    pub min_players: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            max_players: 4,
            min_players: 2,
        }
    }
}

/// Lobby errors.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// No room left.
    #[error("Lobby is full")]
    LobbyFull,

    /// Player is already a member of some lobby.
    #[error("Already in a lobby")]
    AlreadyInLobby,

    /// Operation only allowed between matches.
    #[error("Match in progress")]
    MatchInProgress,

    /// Operation only allowed during a match.
    #[error("No match in progress")]
    MatchNotInProgress,

    /// Operation reserved for the host.
    #[error("Only the host can do that")]
    NotHost,

    /// Too few members to start.
    #[error("Need at least {need} players, have {have}")]
    NotEnoughPlayers {
        /// Current members
        have: usize,
        /// Required members
        need: usize,
    },

    /// Someone is not ready.
    #[error("Not all players are ready")]
    PlayersNotReady,

    /// Map name not in the catalog.
    #[error("Unknown map: {0}")]
    UnknownMap(String),

    /// Player is not in a lobby.
    #[error("Not in a lobby")]
    NotInLobby,

    /// Lobby id does not exist.
    #[error("Lobby not found")]
    LobbyNotFound,

    /// Target player is not a member.
    #[error("Unknown player")]
    UnknownPlayer,

    /// Host tried to kick themselves.
    #[error("Host cannot kick themselves")]
    CannotKickSelf,

    /// Settings rejected.
    #[error("Invalid settings: {0}")]
    Config(#[from] ConfigError),
}

impl LobbyError {
    /// Wire error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            LobbyError::LobbyFull => ErrorCode::LobbyFull,
            LobbyError::AlreadyInLobby => ErrorCode::AlreadyInLobby,
            LobbyError::MatchInProgress => ErrorCode::MatchInProgress,
            LobbyError::MatchNotInProgress => ErrorCode::NotInMatch,
            LobbyError::NotHost => ErrorCode::NotHost,
            LobbyError::NotEnoughPlayers { .. } | LobbyError::PlayersNotReady => ErrorCode::CannotStart,
            LobbyError::UnknownMap(_) => ErrorCode::UnknownMap,
            LobbyError::NotInLobby => ErrorCode::NotInLobby,
            LobbyError::LobbyNotFound => ErrorCode::LobbyNotFound,
            LobbyError::UnknownPlayer | LobbyError::CannotKickSelf => ErrorCode::UnknownPlayer,
            LobbyError::Config(_) => ErrorCode::InvalidSettings,
        }
    }

    /// As an error frame.
    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::error(self.code(), self.to_string())
    }
}

/// Intent forwarded from a connection to the match task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchCommand {
    /// Movement intent.
    Move {
        actor_id: ActorId,
        intent: MoveIntent,
    },
    /// Charge placement.
    PlaceCharge {
        actor_id: ActorId,
    },
}

/// One lobby member.
#[derive(Debug)]
struct LobbyMember {
    id: ActorId,
    name: String,
    ready: bool,
    sender: mpsc::Sender<ServerMessage>,
}

/// A pre-match room.
#[derive(Debug)]
pub struct Lobby {
    /// Lobby identifier.
    pub id: LobbyId,
    /// Display name.
    pub name: String,
    host: ActorId,
    /// Join order; the host is promoted from here.
    members: Vec<LobbyMember>,
    map: String,
    settings: MatchSettings,
    config: LobbyConfig,
    /// Set while a match task is running.
    commands: Option<mpsc::UnboundedSender<MatchCommand>>,
    matches_played: u64,
}

impl Lobby {
    /// Create a lobby with `host` as its only member.
    pub fn new(
        id: LobbyId,
        name: impl Into<String>,
        host: ActorId,
        host_name: impl Into<String>,
        sender: mpsc::Sender<ServerMessage>,
        map: impl Into<String>,
        config: LobbyConfig,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            host,
            members: vec![LobbyMember {
                id: host,
                name: host_name.into(),
                ready: true,
                sender,
            }],
            map: map.into(),
            settings: MatchSettings::default(),
            config,
            commands: None,
            matches_played: 0,
        }
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Add a player.
    pub fn add_member(
        &mut self,
        id: ActorId,
        name: impl Into<String>,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<(), LobbyError> {
        if self.in_match() {
            return Err(LobbyError::MatchInProgress);
        }
        if self.contains(id) {
            return Err(LobbyError::AlreadyInLobby);
        }
        if self.members.len() >= self.config.max_players {
            return Err(LobbyError::LobbyFull);
        }

        self.members.push(LobbyMember {
            id,
            name: name.into(),
            ready: false,
            sender,
        });
        Ok(())
    }

    /// Remove a player, promoting the next member if the host left.
    /// Returns the removed member's sender.
    pub fn remove_member(&mut self, id: ActorId) -> Option<mpsc::Sender<ServerMessage>> {
        let index = self.members.iter().position(|m| m.id == id)?;
        let removed = self.members.remove(index);

        if removed.id == self.host {
            if let Some(next) = self.members.first_mut() {
                next.ready = true;
                self.host = next.id;
                info!("Lobby {} host is now {}", self.id, self.host);
            }
        }

        Some(removed.sender)
    }

    /// Host removes another member. Only allowed between matches.
    pub fn kick(
        &mut self,
        by: ActorId,
        target: ActorId,
    ) -> Result<mpsc::Sender<ServerMessage>, LobbyError> {
        self.require_setup_host(by)?;
        if target == by {
            return Err(LobbyError::CannotKickSelf);
        }
        self.remove_member(target).ok_or(LobbyError::UnknownPlayer)
    }

    /// Set a member's readiness. The host is always ready.
    pub fn set_ready(&mut self, id: ActorId, ready: bool) -> Result<(), LobbyError> {
        if self.in_match() {
            return Err(LobbyError::MatchInProgress);
        }
        let host = self.host;
        let member = self
            .members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(LobbyError::NotInLobby)?;
        member.ready = ready || member.id == host;
        Ok(())
    }

    // =========================================================================
    // Host controls
    // =========================================================================

    /// Change the map.
    pub fn select_map(
        &mut self,
        by: ActorId,
        map: &str,
        catalog: &MapCatalog,
    ) -> Result<(), LobbyError> {
        self.require_setup_host(by)?;
        if !catalog.contains(map) {
            return Err(LobbyError::UnknownMap(map.to_string()));
        }
        self.map = map.to_string();
        self.reset_ready();
        Ok(())
    }

    /// Apply a partial settings update. Nothing changes if any field is
    /// out of range.
    pub fn update_settings(&mut self, by: ActorId, patch: &SettingsPatch) -> Result<(), LobbyError> {
        self.require_setup_host(by)?;
        self.settings = patch.apply(&self.settings)?;
        self.reset_ready();
        Ok(())
    }

    /// Restore default settings.
    pub fn reset_settings(&mut self, by: ActorId) -> Result<(), LobbyError> {
        self.require_setup_host(by)?;
        self.settings = MatchSettings::default();
        self.reset_ready();
        Ok(())
    }

    // =========================================================================
    // Match lifecycle
    // =========================================================================

    /// Whether `by` could start a match now.
    pub fn check_start(&self, by: ActorId) -> Result<(), LobbyError> {
        self.require_setup_host(by)?;
        if self.members.len() < self.config.min_players {
            return Err(LobbyError::NotEnoughPlayers {
                have: self.members.len(),
                need: self.config.min_players,
            });
        }
        if !self.members.iter().all(|m| m.ready) {
            return Err(LobbyError::PlayersNotReady);
        }
        Ok(())
    }

    /// Build the match and mark the lobby as playing. The caller runs the
    /// returned simulation and drains the command receiver.
    pub fn start_match(
        &mut self,
        by: ActorId,
        catalog: &MapCatalog,
        salt: u64,
    ) -> Result<(Simulation, mpsc::UnboundedReceiver<MatchCommand>), LobbyError> {
        self.check_start(by)?;
        let map_text = catalog
            .get(&self.map)
            .ok_or_else(|| LobbyError::UnknownMap(self.map.clone()))?;

        let participants = self.participants();
        let actor_ids: Vec<[u8; 16]> = participants.iter().map(|p| *p.id.as_bytes()).collect();
        let seed = derive_match_seed(self.id.as_bytes(), &actor_ids, salt ^ self.matches_played);

        let simulation = Simulation::new(
            map_text,
            &participants,
            self.settings.clone(),
            Box::new(DeterministicRng::new(seed)),
        )?;

        let (tx, rx) = mpsc::unbounded_channel();
        self.commands = Some(tx);
        self.matches_played += 1;

        info!(
            "Lobby {} starting match {} on '{}' with {} players",
            self.id,
            self.matches_played,
            self.map,
            participants.len()
        );
        Ok((simulation, rx))
    }

    /// Leave match mode. Non-host members must ready up again.
    pub fn end_match(&mut self) {
        self.commands = None;
        self.reset_ready();
    }

    /// Forward an intent to the running match.
    pub fn send_command(&self, command: MatchCommand) -> Result<(), LobbyError> {
        let commands = self.commands.as_ref().ok_or(LobbyError::MatchNotInProgress)?;
        commands
            .send(command)
            .map_err(|_| LobbyError::MatchNotInProgress)
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Participants in join order.
    pub fn participants(&self) -> Vec<Participant> {
        self.members
            .iter()
            .map(|m| Participant::new(m.id, m.name.clone()))
            .collect()
    }

    /// Wire summary.
    pub fn info(&self) -> LobbyInfo {
        LobbyInfo {
            id: self.id,
            name: self.name.clone(),
            host: self.host,
            map: self.map.clone(),
            settings: self.settings.clone(),
            members: self
                .members
                .iter()
                .map(|m| LobbyMemberInfo {
                    id: m.id,
                    name: m.name.clone(),
                    ready: m.ready,
                    is_host: m.id == self.host,
                })
                .collect(),
            max_players: self.config.max_players,
            in_match: self.in_match(),
        }
    }

    /// Send to every member. Full or closed channels drop the message.
    pub fn broadcast(&self, message: &ServerMessage) {
        for member in &self.members {
            if let Err(e) = member.sender.try_send(message.clone()) {
                debug!("Dropped message for {}: {}", member.id, e);
            }
        }
    }

    /// Current host.
    pub fn host(&self) -> ActorId {
        self.host
    }

    /// Selected map name.
    pub fn map(&self) -> &str {
        &self.map
    }

    /// Current settings.
    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Whether a match is running.
    pub fn in_match(&self) -> bool {
        self.commands.is_some()
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: ActorId) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    /// Readiness of a member.
    pub fn is_ready(&self, id: ActorId) -> Option<bool> {
        self.members.iter().find(|m| m.id == id).map(|m| m.ready)
    }

    /// Member count.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True once the last member has left.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn require_host(&self, by: ActorId) -> Result<(), LobbyError> {
        if !self.contains(by) {
            return Err(LobbyError::NotInLobby);
        }
        if by != self.host {
            return Err(LobbyError::NotHost);
        }
        Ok(())
    }

    fn require_setup_host(&self, by: ActorId) -> Result<(), LobbyError> {
        self.require_host(by)?;
        if self.in_match() {
            return Err(LobbyError::MatchInProgress);
        }
        Ok(())
    }

    fn reset_ready(&mut self) {
        let host = self.host;
        for member in &mut self.members {
            member.ready = member.id == host;
        }
    }
}

/// Registry of lobbies.
pub struct LobbyManager {
    /// Live lobbies.
    lobbies: RwLock<BTreeMap<LobbyId, Arc<RwLock<Lobby>>>>,
    /// Player to lobby mapping.
    player_lobbies: RwLock<BTreeMap<ActorId, LobbyId>>,
    config: LobbyConfig,
}

impl LobbyManager {
    /// Create new lobby manager.
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            lobbies: RwLock::new(BTreeMap::new()),
            player_lobbies: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Create a lobby hosted by `host`.
    pub async fn create_lobby(
        &self,
        name: impl Into<String>,
        host: ActorId,
        host_name: impl Into<String>,
        sender: mpsc::Sender<ServerMessage>,
        map: impl Into<String>,
    ) -> Result<Arc<RwLock<Lobby>>, LobbyError> {
        let mut player_lobbies = self.player_lobbies.write().await;
        if player_lobbies.contains_key(&host) {
            return Err(LobbyError::AlreadyInLobby);
        }

        let id = LobbyId::new_v4();
        let lobby = Arc::new(RwLock::new(Lobby::new(
            id,
            name,
            host,
            host_name,
            sender,
            map,
            self.config,
        )));

        self.lobbies.write().await.insert(id, lobby.clone());
        player_lobbies.insert(host, id);

        info!("Lobby {} created by {}", id, host);
        Ok(lobby)
    }

    /// Join an existing lobby.
    pub async fn join_lobby(
        &self,
        lobby_id: LobbyId,
        player: ActorId,
        name: impl Into<String>,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<Arc<RwLock<Lobby>>, LobbyError> {
        let mut player_lobbies = self.player_lobbies.write().await;
        if player_lobbies.contains_key(&player) {
            return Err(LobbyError::AlreadyInLobby);
        }

        let lobby = self
            .get_lobby(&lobby_id)
            .await
            .ok_or(LobbyError::LobbyNotFound)?;
        {
            let mut guard = lobby.write().await;
            if guard.is_empty() {
                return Err(LobbyError::LobbyNotFound);
            }
            guard.add_member(player, name, sender)?;
        }
        player_lobbies.insert(player, lobby_id);

        debug!("Player {} joined lobby {}", player, lobby_id);
        Ok(lobby)
    }

    /// Remove a player from their lobby. Returns the lobby if members
    /// remain; empty lobbies are dropped from the registry.
    pub async fn leave_lobby(&self, player: ActorId) -> Option<Arc<RwLock<Lobby>>> {
        let lobby_id = self.player_lobbies.write().await.remove(&player)?;
        let lobby = self.get_lobby(&lobby_id).await?;

        let now_empty = {
            let mut guard = lobby.write().await;
            guard.remove_member(player);
            guard.is_empty()
        };

        if now_empty {
            self.lobbies.write().await.remove(&lobby_id);
            info!("Lobby {} closed", lobby_id);
            None
        } else {
            Some(lobby)
        }
    }

    /// Host removes `target`. Returns the lobby and the kicked player's
    /// sender.
    pub async fn kick(
        &self,
        by: ActorId,
        target: ActorId,
    ) -> Result<(Arc<RwLock<Lobby>>, mpsc::Sender<ServerMessage>), LobbyError> {
        let lobby = self.player_lobby(&by).await.ok_or(LobbyError::NotInLobby)?;
        let sender = lobby.write().await.kick(by, target)?;
        self.player_lobbies.write().await.remove(&target);

        info!("Player {} kicked from lobby {}", target, lobby.read().await.id);
        Ok((lobby, sender))
    }

    /// Get a lobby by ID.
    pub async fn get_lobby(&self, id: &LobbyId) -> Option<Arc<RwLock<Lobby>>> {
        self.lobbies.read().await.get(id).cloned()
    }

    /// Get the lobby a player is in.
    pub async fn player_lobby(&self, player: &ActorId) -> Option<Arc<RwLock<Lobby>>> {
        let lobby_id = *self.player_lobbies.read().await.get(player)?;
        self.get_lobby(&lobby_id).await
    }

    /// Lobbies that can be joined (no match running).
    pub async fn list_open(&self) -> Vec<LobbyInfo> {
        let lobbies: Vec<_> = self.lobbies.read().await.values().cloned().collect();
        let mut open = Vec::new();
        for lobby in lobbies {
            let guard = lobby.read().await;
            if !guard.in_match() {
                open.push(guard.info());
            }
        }
        open
    }

    /// Get live lobby count.
    pub async fn lobby_count(&self) -> usize {
        self.lobbies.read().await.len()
    }
}

impl Default for LobbyManager {
    fn default() -> Self {
        Self::new(LobbyConfig::default())
    }
}
