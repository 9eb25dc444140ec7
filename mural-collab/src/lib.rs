//! # mural-collab — Session relay and stroke synchronization for Mural
//!
//! Connects peers drawing on the same canvas without any authoritative
//! bitmap. Strokes travel as small deterministic descriptions (seeds,
//! positions, parameter bags) and every peer replays them through the same
//! brush dispatch, so surfaces converge by construction.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐      WebSocket       ┌─────────────┐
//! │ PaintClient │ ◄──────────────────► │ RelayServer │
//! │ (per peer)  │    Binary Envelope   │  (central)  │
//! └──────┬──────┘                      └──────┬──────┘
//!        │                                    │
//!        ▼                                    ▼
//! ┌─────────────┐                      ┌───────────────┐
//! │ PeerSession │                      │SessionRegistry│
//! │ (replay)    │                      │ (fan-out)     │
//! └─────────────┘                      └───────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] — binary wire protocol (bincode-encoded, versioned)
//! - [`registry`] — session membership and route-except-origin fan-out
//! - [`server`] — WebSocket relay; forwards bytes, holds no canvas
//! - [`client`] — WebSocket client with the join handshake
//! - [`session`] — per-peer gesture state machine and replay dispatch
//!
//! Delivery is at-most-once with no cross-peer ordering guarantee; overlap
//! order is whatever each peer's loop applies first. That is the accepted
//! consistency model, not a defect.

pub mod client;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;

// Re-exports for convenience
pub use client::{ConnectionState, PaintClient, PaintEvent};
pub use protocol::{
    DrawEvent, Envelope, ProtocolError, RelayMessage, DEFAULT_SESSION, PROTOCOL_VERSION,
};
pub use registry::{PeerSink, SessionRegistry};
pub use server::{RelayConfig, RelayServer, RelayStats};
pub use session::{PeerSession, SessionOptions};
