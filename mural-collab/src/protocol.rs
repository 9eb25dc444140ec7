//! Binary wire protocol for drawing-event synchronization.
//!
//! Every message travels inside an `Envelope` (bincode-encoded):
//!
//! ```text
//! ┌─────────┬──────────┬───────────────────────────────┐
//! │ version │ peer_id  │ message                       │
//! │ 1 byte  │ 16 bytes │ Join { session } | Draw(...)  │
//! └─────────┴──────────┴───────────────────────────────┘
//! ```
//!
//! The version byte guards deterministic replay: any change to seed
//! derivation or brush parameter shapes breaks convergence with older
//! builds, so decoding rejects foreign versions outright and the caller
//! drops the event. Session routing never looks inside `Draw` payloads —
//! the relay is a pure pass-through for brush parameters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mural_core::brush::BrushParams;
use mural_core::geometry::Vec2;

/// Bumped whenever parameter derivation or message shapes change.
pub const PROTOCOL_VERSION: u8 = 1;

/// Session joined when a peer supplies no identifier of its own.
pub const DEFAULT_SESSION: &str = "lobby";

/// One synchronized rendering operation.
///
/// Positions are normalized to [0, 1] so peers with different canvas sizes
/// draw proportionally the same stroke; every receiver rescales to its own
/// surface before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawEvent {
    /// Pointer position, normalized.
    pub position: Vec2,
    /// Previous gesture sample, normalized. The origin synthesizes a
    /// minimally-offset point when the real one is too close, so
    /// direction-dependent brushes always see a usable vector.
    pub from: Option<Vec2>,
    /// Registry identifier of the brush that produced this event.
    pub brush_id: String,
    /// True for a whole-canvas clear; `params` is absent in that case.
    pub is_clear: bool,
    /// Brush-specific parameter bag; opaque to the relay.
    pub params: Option<BrushParams>,
}

impl DrawEvent {
    /// A draw-primitive event.
    pub fn draw(position: Vec2, from: Option<Vec2>, params: BrushParams) -> Self {
        Self {
            position,
            from,
            brush_id: params.brush_id().to_string(),
            is_clear: false,
            params: Some(params),
        }
    }

    /// A discriminator-only clear event. Idempotent on every receiver and
    /// safe to reorder.
    pub fn clear() -> Self {
        Self {
            position: Vec2::ZERO,
            from: None,
            brush_id: String::new(),
            is_clear: true,
            params: None,
        }
    }
}

/// Messages understood by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelayMessage {
    /// Bind the sending peer to a session. An empty identifier means the
    /// default session.
    Join { session_id: String },
    /// A drawing event to fan out to the peer's session.
    Draw(DrawEvent),
}

/// Top-level wire message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: u8,
    pub peer_id: Uuid,
    pub message: RelayMessage,
}

impl Envelope {
    /// Join handshake; an empty session id falls back to [`DEFAULT_SESSION`].
    pub fn join(peer_id: Uuid, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        let session_id =
            if session_id.is_empty() { DEFAULT_SESSION.to_string() } else { session_id };
        Self {
            version: PROTOCOL_VERSION,
            peer_id,
            message: RelayMessage::Join { session_id },
        }
    }

    pub fn draw(peer_id: Uuid, event: DrawEvent) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            peer_id,
            message: RelayMessage::Draw(event),
        }
    }

    /// Serialize to binary wire format.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| ProtocolError::SerializationError(e.to_string()))
    }

    /// Deserialize from binary wire format, rejecting foreign versions.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (envelope, _): (Envelope, _) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| ProtocolError::DeserializationError(e.to_string()))?;
        if envelope.version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                ours: PROTOCOL_VERSION,
                theirs: envelope.version,
            });
        }
        Ok(envelope)
    }
}

/// Protocol errors.
#[derive(Debug, Clone)]
pub enum ProtocolError {
    SerializationError(String),
    DeserializationError(String),
    VersionMismatch { ours: u8, theirs: u8 },
    ConnectionClosed,
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SerializationError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializationError(e) => write!(f, "Deserialization error: {e}"),
            Self::VersionMismatch { ours, theirs } => {
                write!(f, "Protocol version mismatch: ours {ours}, theirs {theirs}")
            }
            Self::ConnectionClosed => write!(f, "Connection closed"),
        }
    }
}

impl std::error::Error for ProtocolError {}
