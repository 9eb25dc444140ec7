//! WebSocket client for connecting a peer to the relay.
//!
//! Provides:
//! - Connection lifecycle (connect, disconnect)
//! - The join handshake binding this peer to a session
//! - Fire-and-forget event send (no retry, no offline queue — a stroke that
//!   misses the wire is simply not replayed elsewhere)
//! - An event channel surfacing remote draws to the application

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::protocol::{DrawEvent, Envelope, ProtocolError, RelayMessage, DEFAULT_SESSION};

/// Client connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Events emitted by the paint client.
#[derive(Debug, Clone)]
pub enum PaintEvent {
    /// Connection established and join handshake sent.
    Connected,
    /// Connection lost.
    Disconnected,
    /// A drawing event from a peer in our session.
    RemoteDraw(DrawEvent),
}

/// The paint client.
pub struct PaintClient {
    peer_id: Uuid,
    session_id: String,
    server_url: String,
    state: Arc<RwLock<ConnectionState>>,
    /// Channel to the WebSocket writer task.
    outgoing_tx: Option<mpsc::Sender<Vec<u8>>>,
    /// Event receiver for the application.
    event_rx: Option<mpsc::Receiver<PaintEvent>>,
    /// Event sender (held by the reader task).
    event_tx: mpsc::Sender<PaintEvent>,
}

impl PaintClient {
    /// Create a client bound to `session_id`; an empty identifier means the
    /// default session.
    pub fn new(session_id: impl Into<String>, server_url: impl Into<String>) -> Self {
        let session_id = session_id.into();
        let session_id =
            if session_id.is_empty() { DEFAULT_SESSION.to_string() } else { session_id };
        let (event_tx, event_rx) = mpsc::channel(256);
        Self {
            peer_id: Uuid::new_v4(),
            session_id,
            server_url: server_url.into(),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            outgoing_tx: None,
            event_rx: Some(event_rx),
            event_tx,
        }
    }

    /// Take the event receiver (can only be called once).
    pub fn take_event_rx(&mut self) -> Option<mpsc::Receiver<PaintEvent>> {
        self.event_rx.take()
    }

    /// Connect to the relay and send the join handshake.
    ///
    /// Spawns background tasks for reading/writing WebSocket messages.
    pub async fn connect(&mut self) -> Result<(), ProtocolError> {
        *self.state.write().await = ConnectionState::Connecting;

        let ws_stream = match tokio_tungstenite::connect_async(&self.server_url).await {
            Ok((stream, _)) => stream,
            Err(e) => {
                log::warn!("connect to {} failed: {e}", self.server_url);
                *self.state.write().await = ConnectionState::Disconnected;
                return Err(ProtocolError::ConnectionClosed);
            }
        };

        let (mut ws_writer, mut ws_reader) = ws_stream.split();

        // Writer task: forward the outgoing channel to the WebSocket.
        let (out_tx, mut out_rx) = mpsc::channel::<Vec<u8>>(256);
        self.outgoing_tx = Some(out_tx);
        tokio::spawn(async move {
            while let Some(data) = out_rx.recv().await {
                if ws_writer
                    .send(tokio_tungstenite::tungstenite::Message::Binary(data.into()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        // Join handshake binds us to the session before anything else flows.
        let join = Envelope::join(self.peer_id, self.session_id.clone());
        let encoded = join.encode()?;
        if let Some(ref tx) = self.outgoing_tx {
            tx.send(encoded)
                .await
                .map_err(|_| ProtocolError::ConnectionClosed)?;
        }

        *self.state.write().await = ConnectionState::Connected;
        let _ = self.event_tx.send(PaintEvent::Connected).await;

        // Reader task: surface remote draw events to the application.
        let event_tx = self.event_tx.clone();
        let state = self.state.clone();
        let peer_id = self.peer_id;
        tokio::spawn(async move {
            while let Some(msg) = ws_reader.next().await {
                match msg {
                    Ok(tokio_tungstenite::tungstenite::Message::Binary(data)) => {
                        let bytes: Vec<u8> = data.into();
                        match Envelope::decode(&bytes) {
                            Ok(envelope) => {
                                if envelope.peer_id == peer_id {
                                    continue; // Never replay our own strokes.
                                }
                                if let RelayMessage::Draw(event) = envelope.message {
                                    let _ = event_tx.send(PaintEvent::RemoteDraw(event)).await;
                                }
                            }
                            Err(ProtocolError::VersionMismatch { ours, theirs }) => {
                                log::warn!(
                                    "dropping event from incompatible build: \
                                     version {theirs}, ours {ours}"
                                );
                            }
                            Err(e) => {
                                log::warn!("failed to decode relay message: {e}");
                            }
                        }
                    }
                    Ok(tokio_tungstenite::tungstenite::Message::Close(_)) | Err(_) => {
                        break;
                    }
                    _ => {}
                }
            }

            // Connection lost.
            *state.write().await = ConnectionState::Disconnected;
            let _ = event_tx.send(PaintEvent::Disconnected).await;
        });

        Ok(())
    }

    /// Rebind to another session. Takes effect immediately on the relay; the
    /// old session stops delivering to us the moment it processes the join.
    pub async fn join_session(&mut self, session_id: impl Into<String>) -> Result<(), ProtocolError> {
        let session_id = session_id.into();
        self.session_id =
            if session_id.is_empty() { DEFAULT_SESSION.to_string() } else { session_id };

        if *self.state.read().await != ConnectionState::Connected {
            return Ok(()); // Applied at the next connect.
        }
        let join = Envelope::join(self.peer_id, self.session_id.clone());
        let encoded = join.encode()?;
        if let Some(ref tx) = self.outgoing_tx {
            tx.send(encoded)
                .await
                .map_err(|_| ProtocolError::ConnectionClosed)?;
        }
        Ok(())
    }

    /// Send a drawing event. Fire-and-forget: once sent it cannot be
    /// retracted, and a failed send is not retried.
    pub async fn send_event(&self, event: DrawEvent) -> Result<(), ProtocolError> {
        if *self.state.read().await != ConnectionState::Connected {
            return Err(ProtocolError::ConnectionClosed);
        }
        let envelope = Envelope::draw(self.peer_id, event);
        let encoded = envelope.encode()?;
        if let Some(ref tx) = self.outgoing_tx {
            tx.send(encoded)
                .await
                .map_err(|_| ProtocolError::ConnectionClosed)?;
        }
        Ok(())
    }

    /// Get the current connection state.
    pub async fn connection_state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub fn peer_id(&self) -> Uuid {
        self.peer_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}
