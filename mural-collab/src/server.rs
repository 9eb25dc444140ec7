//! WebSocket relay with session-based event routing.
//!
//! Architecture:
//! ```text
//! Peer A ──┐
//!           ├── Session ("garden") ── SessionRegistry ──► every peer but A
//! Peer B ──┘                              │
//!                                         └── no document state, no bitmap:
//!                                             the relay only forwards bytes
//! ```
//!
//! The relay holds no authoritative canvas. Convergence comes from every
//! peer deterministically replaying the same events; the server's whole job
//! is membership and fan-out. Draw payloads pass through pre-encoded and
//! untouched.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use crate::protocol::{Envelope, ProtocolError, RelayMessage, DEFAULT_SESSION};
use crate::registry::SessionRegistry;

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address to bind to
    pub bind_addr: String,
    /// Soft cap on peers per session; joins beyond it are refused
    pub max_peers_per_session: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9091".to_string(),
            max_peers_per_session: 64,
        }
    }
}

/// Relay statistics.
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    pub total_connections: u64,
    pub active_connections: u64,
    pub events_routed: u64,
    pub bytes_routed: u64,
    pub active_sessions: usize,
}

/// The relay server.
pub struct RelayServer {
    config: RelayConfig,
    registry: Arc<Mutex<SessionRegistry>>,
    stats: Arc<RwLock<RelayStats>>,
}

impl RelayServer {
    /// Create a new relay with the given configuration.
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            registry: Arc::new(Mutex::new(SessionRegistry::new())),
            stats: Arc::new(RwLock::new(RelayStats::default())),
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RelayConfig::default())
    }

    /// Start listening for WebSocket connections.
    ///
    /// This runs the relay event loop. Call from an async runtime.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        log::info!("Relay listening on {}", self.config.bind_addr);

        loop {
            let (stream, addr) = listener.accept().await?;
            log::debug!("New TCP connection from {addr}");

            let registry = self.registry.clone();
            let stats = self.stats.clone();
            let config = self.config.clone();

            tokio::spawn(async move {
                if let Err(e) = Self::handle_connection(stream, addr, registry, stats, config).await
                {
                    log::error!("Connection error from {addr}: {e}");
                }
            });
        }
    }

    /// Handle a single WebSocket connection.
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        registry: Arc<Mutex<SessionRegistry>>,
        stats: Arc<RwLock<RelayStats>>,
        config: RelayConfig,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ws_stream = tokio_tungstenite::accept_async(stream).await?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        log::info!("WebSocket connection established from {addr}");

        {
            let mut s = stats.write().await;
            s.total_connections += 1;
            s.active_connections += 1;
        }

        // Connection state: identity arrives with the first Join.
        let mut peer_id: Option<Uuid> = None;
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Arc<Vec<u8>>>();

        loop {
            tokio::select! {
                // Incoming WebSocket message
                msg = ws_receiver.next() => {
                    match msg {
                        Some(Ok(Message::Binary(data))) => {
                            let bytes: Vec<u8> = data.into();
                            match Envelope::decode(&bytes) {
                                Ok(envelope) => match envelope.message {
                                    RelayMessage::Join { session_id } => {
                                        let session_id = if session_id.is_empty() {
                                            DEFAULT_SESSION.to_string()
                                        } else {
                                            session_id
                                        };
                                        let mut reg = registry.lock().await;
                                        if reg.session_peers(&session_id).len()
                                            >= config.max_peers_per_session
                                        {
                                            log::warn!(
                                                "session {session_id:?} full; refusing {addr}"
                                            );
                                            continue;
                                        }
                                        reg.join(envelope.peer_id, &session_id, out_tx.clone());
                                        peer_id = Some(envelope.peer_id);

                                        let session_count = reg.session_count();
                                        drop(reg);
                                        let mut s = stats.write().await;
                                        s.active_sessions = session_count;
                                    }

                                    RelayMessage::Draw(_) => {
                                        // Pure pass-through: route the original
                                        // bytes, never a re-encoding.
                                        let len = bytes.len() as u64;
                                        let delivered = registry
                                            .lock()
                                            .await
                                            .route(&envelope.peer_id, Arc::new(bytes));

                                        if delivered > 0 {
                                            let mut s = stats.write().await;
                                            s.events_routed += 1;
                                            s.bytes_routed += len * delivered as u64;
                                        }
                                    }
                                },
                                Err(ProtocolError::VersionMismatch { ours, theirs }) => {
                                    log::warn!(
                                        "dropping event from {addr}: version {theirs}, ours {ours}"
                                    );
                                }
                                Err(e) => {
                                    log::warn!("Failed to decode message from {addr}: {e}");
                                }
                            }
                        }

                        Some(Ok(Message::Close(_))) | None => {
                            log::info!("Connection closed from {addr}");
                            break;
                        }

                        Some(Ok(Message::Ping(data))) => {
                            ws_sender.send(Message::Pong(data)).await?;
                        }

                        Some(Err(e)) => {
                            log::error!("WebSocket error from {addr}: {e}");
                            break;
                        }

                        _ => {}
                    }
                }

                // Outgoing routed event
                out = out_rx.recv() => {
                    match out {
                        Some(data) => {
                            ws_sender.send(Message::Binary(data.to_vec().into())).await?;
                        }
                        None => break,
                    }
                }
            }
        }

        // Cleanup: unbind the peer; its session disappears with its last member.
        if let Some(pid) = peer_id {
            let mut reg = registry.lock().await;
            reg.leave(&pid);
            let session_count = reg.session_count();
            drop(reg);

            let mut s = stats.write().await;
            s.active_connections -= 1;
            s.active_sessions = session_count;
        } else {
            let mut s = stats.write().await;
            s.active_connections -= 1;
        }

        Ok(())
    }

    /// Get relay statistics.
    pub async fn stats(&self) -> RelayStats {
        self.stats.read().await.clone()
    }

    /// Get the configured bind address.
    pub fn bind_addr(&self) -> &str {
        &self.config.bind_addr
    }

    /// Get the shared session registry.
    pub fn registry(&self) -> &Arc<Mutex<SessionRegistry>> {
        &self.registry
    }
}
