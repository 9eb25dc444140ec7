//! Mural relay — headless session relay for shared canvases.
//!
//! Configuration comes from the environment:
//! - `MURAL_BIND` — listen address (default `127.0.0.1:9091`)
//! - `MURAL_MAX_PEERS` — peers per session (default 64)
//! - `RUST_LOG` — log filter (env_logger)

use log::info;

use mural_collab::server::{RelayConfig, RelayServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let defaults = RelayConfig::default();
    let config = RelayConfig {
        bind_addr: std::env::var("MURAL_BIND").unwrap_or(defaults.bind_addr),
        max_peers_per_session: std::env::var("MURAL_MAX_PEERS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_peers_per_session),
    };

    info!(
        "starting mural relay on {} (max {} peers/session)",
        config.bind_addr, config.max_peers_per_session
    );

    let relay = RelayServer::new(config);
    relay.run().await
}
