//! WebSocket Game Server
//!
//! Async WebSocket server for multiplayer connections.
//! Handles lobby messages, forwards match intents, and runs one tick loop
//! per active match.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::game::actor::ActorId;
use crate::game::input::MoveIntent;
use crate::game::simulation::Simulation;
use crate::game::snapshot::ChargeView;
use crate::network::lobby::{Lobby, LobbyConfig, LobbyError, LobbyManager, MatchCommand};
use crate::network::maps::{MapCatalog, DEFAULT_MAP_NAME};
use crate::network::protocol::{ClientMessage, ErrorCode, ServerMessage};

/// Longest accepted display or lobby name (characters).
pub const MAX_NAME_LEN: usize = 24;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Tick rate for game simulation (Hz).
    pub tick_rate: u32,
    /// Directory of `*.txt` maps.
    pub maps_dir: PathBuf,
    /// Lobby size limits.
    pub lobby: LobbyConfig,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            tick_rate: crate::TICK_RATE,
            maps_dir: PathBuf::from("maps"),
            lobby: LobbyConfig::default(),
            version: crate::VERSION.to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `BLAST_ARENA_*` environment variables.
    pub fn from_env() -> Result<Self, GameServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GameServerError> {
        let mut config = Self::default();

        if let Some(bind) = lookup("BLAST_ARENA_BIND") {
            config.bind_addr = bind
                .parse()
                .map_err(|_| GameServerError::InvalidConfig(format!("BLAST_ARENA_BIND={}", bind)))?;
        }
        if let Some(rate) = lookup("BLAST_ARENA_TICK_RATE") {
            config.tick_rate = rate
                .parse()
                .ok()
                .filter(|r| (1..=1000).contains(r))
                .ok_or_else(|| GameServerError::InvalidConfig(format!("BLAST_ARENA_TICK_RATE={}", rate)))?;
        }
        if let Some(dir) = lookup("BLAST_ARENA_MAPS_DIR") {
            config.maps_dir = PathBuf::from(dir);
        }
        if let Some(max) = lookup("BLAST_ARENA_MAX_CONNECTIONS") {
            config.max_connections = max.parse().map_err(|_| {
                GameServerError::InvalidConfig(format!("BLAST_ARENA_MAX_CONNECTIONS={}", max))
            })?;
        }

        Ok(config)
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Lobby error.
    #[error("Lobby error: {0}")]
    Lobby(#[from] LobbyError),

    /// Bad configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Connected client state.
struct ConnectedClient {
    /// Display name.
    name: String,
}

/// State shared by every connection task.
struct Shared {
    config: ServerConfig,
    lobbies: LobbyManager,
    maps: MapCatalog,
    clients: RwLock<BTreeMap<SocketAddr, ConnectedClient>>,
}

/// The game server.
pub struct GameServer {
    shared: Arc<Shared>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server, loading maps from `config.maps_dir`.
    pub fn new(config: ServerConfig) -> Self {
        let maps = MapCatalog::load_or_builtin(&config.maps_dir);
        Self::with_maps(config, maps)
    }

    /// Create a new game server with an explicit map catalog.
    pub fn with_maps(config: ServerConfig, maps: MapCatalog) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            shared: Arc::new(Shared {
                lobbies: LobbyManager::new(config.lobby),
                config,
                maps,
                clients: RwLock::new(BTreeMap::new()),
            }),
            shutdown_tx,
        }
    }

    /// Run the server.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.shared.config.bind_addr).await?;
        info!("Game server listening on {}", self.shared.config.bind_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.shared.clients.read().await.len();
                            if clients_count >= self.shared.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let shared = self.shared.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(256);
            let player_id = ActorId::new_v4();

            // Register client
            shared.clients.write().await.insert(addr, ConnectedClient {
                name: "Player".to_string(),
            });

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            let _ = msg_tx.send(ServerMessage::Connected {
                player_id,
                server_version: shared.config.version.clone(),
            }).await;

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        let _ = msg_tx.send(ServerMessage::error(
                                            ErrorCode::InvalidInput,
                                            "Invalid message format",
                                        )).await;
                                        continue;
                                    }
                                };

                                Self::handle_client_message(&shared, addr, player_id, client_msg, &msg_tx).await;
                            }
                            Some(Ok(Message::Binary(_))) => {
                                let _ = msg_tx.send(ServerMessage::error(
                                    ErrorCode::InvalidInput,
                                    "Binary frames are not supported",
                                )).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                warn!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            // Cleanup
            Self::leave_lobby(&shared, player_id).await;
            shared.clients.write().await.remove(&addr);
            sender_task.abort();

            info!("Client {} cleaned up", addr);
        });
    }

    /// Handle a client message, reporting failures back to the sender.
    async fn handle_client_message(
        shared: &Arc<Shared>,
        addr: SocketAddr,
        player_id: ActorId,
        msg: ClientMessage,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        if let Err(e) = Self::dispatch(shared, addr, player_id, msg, sender).await {
            debug!("Request from {} failed: {}", player_id, e);
            let _ = sender.send(e.to_message()).await;
        }
    }

    async fn dispatch(
        shared: &Arc<Shared>,
        addr: SocketAddr,
        player_id: ActorId,
        msg: ClientMessage,
        sender: &mpsc::Sender<ServerMessage>,
    ) -> Result<(), LobbyError> {
        match msg {
            ClientMessage::SetName { name } => {
                let name = sanitize_name(&name, "Player");
                if let Some(client) = shared.clients.write().await.get_mut(&addr) {
                    client.name = name.clone();
                }
                let _ = sender.send(ServerMessage::NameSet { name }).await;
            }
            ClientMessage::ListLobbies => {
                let lobbies = shared.lobbies.list_open().await;
                let _ = sender.send(ServerMessage::LobbyList { lobbies }).await;
            }
            ClientMessage::ListMaps => {
                let _ = sender.send(ServerMessage::MapList { maps: shared.maps.names() }).await;
            }
            ClientMessage::CreateLobby { name, map } => {
                let map = map.unwrap_or_else(|| DEFAULT_MAP_NAME.to_string());
                if !shared.maps.contains(&map) {
                    return Err(LobbyError::UnknownMap(map));
                }
                let host_name = Self::client_name(shared, addr).await;
                let lobby = shared
                    .lobbies
                    .create_lobby(sanitize_name(&name, "New Game"), player_id, host_name, sender.clone(), map)
                    .await?;
                Self::broadcast_update(&lobby).await;
            }
            ClientMessage::JoinLobby { lobby_id } => {
                let name = Self::client_name(shared, addr).await;
                let lobby = shared
                    .lobbies
                    .join_lobby(lobby_id, player_id, name, sender.clone())
                    .await?;
                Self::broadcast_update(&lobby).await;
            }
            ClientMessage::LeaveLobby => {
                if !Self::leave_lobby(shared, player_id).await {
                    return Err(LobbyError::NotInLobby);
                }
                let lobbies = shared.lobbies.list_open().await;
                let _ = sender.send(ServerMessage::LobbyList { lobbies }).await;
            }
            ClientMessage::SetReady { ready } => {
                let lobby = Self::lobby_of(shared, player_id).await?;
                lobby.write().await.set_ready(player_id, ready)?;
                Self::broadcast_update(&lobby).await;
            }
            ClientMessage::SelectMap { map } => {
                let lobby = Self::lobby_of(shared, player_id).await?;
                lobby.write().await.select_map(player_id, &map, &shared.maps)?;
                Self::broadcast_update(&lobby).await;
            }
            ClientMessage::UpdateSettings { settings } => {
                let lobby = Self::lobby_of(shared, player_id).await?;
                lobby.write().await.update_settings(player_id, &settings)?;
                Self::broadcast_update(&lobby).await;
            }
            ClientMessage::ResetSettings => {
                let lobby = Self::lobby_of(shared, player_id).await?;
                lobby.write().await.reset_settings(player_id)?;
                Self::broadcast_update(&lobby).await;
            }
            ClientMessage::KickPlayer { player_id: target } => {
                let (lobby, kicked) = shared.lobbies.kick(player_id, target).await?;
                let guard = lobby.read().await;
                let notice = ServerMessage::PlayerLeft {
                    player_id: target,
                    lobby: guard.info(),
                };
                let _ = kicked.try_send(notice.clone());
                guard.broadcast(&notice);
            }
            ClientMessage::StartMatch => {
                Self::start_match(shared, player_id).await?;
            }
            ClientMessage::Move { vx, vy } => {
                let lobby = Self::lobby_of(shared, player_id).await?;
                let command = MatchCommand::Move {
                    actor_id: player_id,
                    intent: MoveIntent::velocity(vx, vy),
                };
                lobby.read().await.send_command(command)?;
            }
            ClientMessage::ReportPosition { x, y } => {
                let lobby = Self::lobby_of(shared, player_id).await?;
                let command = MatchCommand::Move {
                    actor_id: player_id,
                    intent: MoveIntent::position(x, y),
                };
                lobby.read().await.send_command(command)?;
            }
            ClientMessage::PlaceCharge => {
                let lobby = Self::lobby_of(shared, player_id).await?;
                lobby.read().await.send_command(MatchCommand::PlaceCharge { actor_id: player_id })?;
            }
            ClientMessage::Ping { timestamp } => {
                let _ = sender.send(ServerMessage::Pong {
                    timestamp,
                    server_time: chrono::Utc::now().timestamp_millis().max(0) as u64,
                }).await;
            }
        }

        Ok(())
    }

    /// Build the simulation and hand it to a new match task.
    async fn start_match(shared: &Arc<Shared>, player_id: ActorId) -> Result<(), LobbyError> {
        let lobby = Self::lobby_of(shared, player_id).await?;
        let salt = chrono::Utc::now().timestamp_millis() as u64;

        let (simulation, commands) = {
            let mut guard = lobby.write().await;
            let started = guard.start_match(player_id, &shared.maps, salt)?;
            guard.broadcast(&ServerMessage::LobbyUpdate { lobby: guard.info() });
            guard.broadcast(&ServerMessage::State(Box::new(started.0.snapshot())));
            started
        };

        let tick_rate = shared.config.tick_rate;
        tokio::spawn(run_match_loop(lobby, simulation, commands, tick_rate));
        Ok(())
    }

    /// Remove a player from their lobby and tell whoever remains.
    async fn leave_lobby(shared: &Arc<Shared>, player_id: ActorId) -> bool {
        if shared.lobbies.player_lobby(&player_id).await.is_none() {
            return false;
        }
        if let Some(lobby) = shared.lobbies.leave_lobby(player_id).await {
            let guard = lobby.read().await;
            guard.broadcast(&ServerMessage::PlayerLeft {
                player_id,
                lobby: guard.info(),
            });
        }
        true
    }

    async fn lobby_of(shared: &Arc<Shared>, player_id: ActorId) -> Result<Arc<RwLock<Lobby>>, LobbyError> {
        shared
            .lobbies
            .player_lobby(&player_id)
            .await
            .ok_or(LobbyError::NotInLobby)
    }

    async fn client_name(shared: &Arc<Shared>, addr: SocketAddr) -> String {
        shared
            .clients
            .read()
            .await
            .get(&addr)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "Player".to_string())
    }

    async fn broadcast_update(lobby: &Arc<RwLock<Lobby>>) {
        let guard = lobby.read().await;
        guard.broadcast(&ServerMessage::LobbyUpdate { lobby: guard.info() });
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.shared.clients.read().await.len()
    }

    /// Get live lobby count.
    pub async fn lobby_count(&self) -> usize {
        self.shared.lobbies.lobby_count().await
    }

    /// Loaded map names.
    pub fn map_names(&self) -> Vec<String> {
        self.shared.maps.names()
    }
}

/// Trim, drop control characters and cap length; empty becomes `fallback`.
fn sanitize_name(raw: &str, fallback: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_LEN)
        .collect();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Drive one match to completion.
///
/// The task owns the simulation. Each tick it drains queued intents,
/// advances by the measured wall-clock delta, and broadcasts the result.
/// It stops when the match ends, the lobby empties, or the lobby drops
/// its command sender.
pub(crate) async fn run_match_loop(
    lobby: Arc<RwLock<Lobby>>,
    mut simulation: Simulation,
    mut commands: mpsc::UnboundedReceiver<MatchCommand>,
    tick_rate: u32,
) {
    let lobby_id = lobby.read().await.id;
    let tick_duration = Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1)));
    let mut tick_interval = interval(tick_duration);
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();

    loop {
        tick_interval.tick().await;
        let now = Instant::now();
        let elapsed = now - last_tick;
        last_tick = now;

        let mut placed = Vec::new();
        loop {
            match commands.try_recv() {
                Ok(MatchCommand::Move { actor_id, intent }) => {
                    simulation.request_move(actor_id, intent);
                }
                Ok(MatchCommand::PlaceCharge { actor_id }) => {
                    if let Some(id) = simulation.request_place_charge(actor_id) {
                        if let Some(charge) = simulation.charges().find(|c| c.id == id) {
                            placed.push(ChargeView::from(charge));
                        }
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("Match in lobby {} abandoned", lobby_id);
                    return;
                }
            }
        }

        let result = simulation.advance(elapsed);

        {
            let guard = lobby.read().await;
            if guard.is_empty() {
                info!("Match in lobby {} abandoned", lobby_id);
                return;
            }

            for charge in placed {
                guard.broadcast(&ServerMessage::ChargePlaced { charge });
            }
            if !result.events.is_empty() {
                guard.broadcast(&ServerMessage::Events {
                    tick: simulation.tick(),
                    events: result.events,
                });
            }
            guard.broadcast(&ServerMessage::State(Box::new(simulation.snapshot())));
        }

        if result.match_ended {
            let mut guard = lobby.write().await;
            guard.end_match();
            guard.broadcast(&ServerMessage::ReturnToLobby {
                lobby: guard.info(),
                winner: result.winner,
            });
            info!(
                "Match in lobby {} ended after {} ticks, winner {:?}",
                lobby_id,
                simulation.tick(),
                result.winner
            );
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::GameEventData;
    use crate::game::settings::SettingsPatch;
    use crate::network::lobby::LobbyId;

    fn player(n: u8) -> ActorId {
        ActorId::from_bytes([n; 16])
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.lobby.max_players, 4);
        assert_eq!(config.lobby.min_players, 2);
    }

    #[test]
    fn test_server_config_overrides() {
        let config = ServerConfig::from_lookup(|key| match key {
            "BLAST_ARENA_BIND" => Some("127.0.0.1:9000".to_string()),
            "BLAST_ARENA_TICK_RATE" => Some("30".to_string()),
            "BLAST_ARENA_MAPS_DIR" => Some("/srv/maps".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.maps_dir, PathBuf::from("/srv/maps"));
        assert_eq!(config.max_connections, 1000);
    }

    #[test]
    fn test_server_config_rejects_garbage() {
        let bad_rate = ServerConfig::from_lookup(|key| {
            (key == "BLAST_ARENA_TICK_RATE").then(|| "0".to_string())
        });
        assert!(matches!(bad_rate, Err(GameServerError::InvalidConfig(_))));

        let bad_bind = ServerConfig::from_lookup(|key| {
            (key == "BLAST_ARENA_BIND").then(|| "nowhere".to_string())
        });
        assert!(matches!(bad_bind, Err(GameServerError::InvalidConfig(_))));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("  bob  ", "Player"), "bob");
        assert_eq!(sanitize_name("   ", "Player"), "Player");
        assert_eq!(sanitize_name("a\u{0}b", "Player"), "ab");
        assert_eq!(sanitize_name(&"x".repeat(100), "Player").len(), MAX_NAME_LEN);
    }

    #[tokio::test]
    async fn test_server_creation() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = GameServer::with_maps(config, MapCatalog::builtin());

        assert_eq!(server.connection_count().await, 0);
        assert_eq!(server.lobby_count().await, 0);
        assert_eq!(server.map_names(), vec![DEFAULT_MAP_NAME.to_string()]);
    }

    #[tokio::test]
    async fn test_server_shutdown() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = GameServer::with_maps(config, MapCatalog::builtin());
        server.shutdown();
        // Should not panic
    }

    #[tokio::test(start_paused = true)]
    async fn test_match_loop_runs_to_return_to_lobby() {
        let mut catalog = MapCatalog::builtin();
        // One spawn: both actors start stacked on the charge tile
        catalog.insert("duel", "#####\n#S..#\n#####").unwrap();

        let (tx1, mut rx1) = mpsc::channel(4096);
        let (tx2, _rx2) = mpsc::channel(4096);
        let mut lobby = Lobby::new(LobbyId::new_v4(), "duel", player(1), "one", tx1, "duel", LobbyConfig::default());
        lobby.add_member(player(2), "two", tx2).unwrap();
        lobby
            .update_settings(player(1), &SettingsPatch {
                charge_timer_ms: Some(1000),
                ..Default::default()
            })
            .unwrap();
        lobby.set_ready(player(2), true).unwrap();

        let (simulation, commands) = lobby.start_match(player(1), &catalog, 7).unwrap();
        lobby.send_command(MatchCommand::PlaceCharge { actor_id: player(1) }).unwrap();

        let lobby = Arc::new(RwLock::new(lobby));
        let handle = tokio::spawn(run_match_loop(lobby.clone(), simulation, commands, 60));

        let mut saw_charge = false;
        let mut kills = 0;
        let winner = loop {
            match rx1.recv().await {
                Some(ServerMessage::ChargePlaced { charge }) => {
                    assert_eq!(charge.owner, player(1));
                    saw_charge = true;
                }
                Some(ServerMessage::Events { events, .. }) => {
                    kills += events
                        .iter()
                        .filter(|e| matches!(e.data, GameEventData::ActorKilled { .. }))
                        .count();
                }
                Some(ServerMessage::ReturnToLobby { lobby, winner }) => {
                    assert!(!lobby.in_match);
                    break winner;
                }
                Some(_) => {}
                None => panic!("Channel closed before match end"),
            }
        };

        handle.await.unwrap();
        assert!(saw_charge);
        assert_eq!(kills, 2);
        assert_eq!(winner, None);

        let guard = lobby.read().await;
        assert!(!guard.in_match());
        assert_eq!(guard.is_ready(player(2)), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_match_loop_stops_when_lobby_empties() {
        let catalog = MapCatalog::builtin();
        let (tx1, _rx1) = mpsc::channel(4096);
        let (tx2, _rx2) = mpsc::channel(4096);
        let mut lobby = Lobby::new(LobbyId::new_v4(), "gone", player(1), "one", tx1, DEFAULT_MAP_NAME, LobbyConfig::default());
        lobby.add_member(player(2), "two", tx2).unwrap();
        lobby.set_ready(player(2), true).unwrap();

        let (simulation, commands) = lobby.start_match(player(1), &catalog, 7).unwrap();
        let lobby = Arc::new(RwLock::new(lobby));
        let handle = tokio::spawn(run_match_loop(lobby.clone(), simulation, commands, 60));

        {
            let mut guard = lobby.write().await;
            guard.remove_member(player(1));
            guard.remove_member(player(2));
        }

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("match loop should stop")
            .unwrap();
    }
}
