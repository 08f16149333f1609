//! Blast Arena Game Server
//!
//! Loads maps, binds the WebSocket listener and runs until Ctrl-C.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use blast_arena::{
    network::{GameServer, ServerConfig},
    TICK_RATE, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env().context("reading BLAST_ARENA_* environment")?;

    info!("Blast Arena Server v{}", VERSION);
    info!("Tick Rate: {} Hz (default {})", config.tick_rate, TICK_RATE);
    info!("Maps directory: {}", config.maps_dir.display());

    let server = GameServer::new(config);
    info!("Maps: {}", server.map_names().join(", "));

    tokio::select! {
        result = server.run() => {
            result.context("server stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
            server.shutdown();
        }
    }

    Ok(())
}
