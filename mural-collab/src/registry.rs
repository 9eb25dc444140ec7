//! Session registry: who is drawing together, and event fan-out.
//!
//! Sessions are string-keyed sets of peers, created lazily on first join and
//! deleted when their last peer leaves. A peer belongs to at most one
//! session; joining another removes the previous binding. Routing delivers
//! a pre-encoded event to every peer in the origin's session except the
//! origin itself — the relay never re-encodes and never inspects brush
//! parameters.
//!
//! All operations are plain map updates; the server holds the registry
//! behind a single lock so join/route/leave are atomic with respect to each
//! other.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::DEFAULT_SESSION;

/// Outbound channel handle for one connected peer.
pub type PeerSink = mpsc::UnboundedSender<Arc<Vec<u8>>>;

struct PeerHandle {
    sink: PeerSink,
    /// Session binding, recorded on the peer for O(1) route lookup.
    session: String,
}

/// In-memory session membership and routing.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, HashSet<Uuid>>,
    peers: HashMap<Uuid, PeerHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `peer_id` to `session_id`, removing it from any session it
    /// currently occupies. An empty identifier binds the default session.
    pub fn join(&mut self, peer_id: Uuid, session_id: &str, sink: PeerSink) {
        let session_id =
            if session_id.is_empty() { DEFAULT_SESSION } else { session_id }.to_string();

        if let Some(handle) = self.peers.get(&peer_id) {
            let previous = handle.session.clone();
            if previous != session_id {
                self.remove_membership(&peer_id, &previous);
            }
        }

        self.sessions.entry(session_id.clone()).or_default().insert(peer_id);
        self.peers.insert(peer_id, PeerHandle { sink, session: session_id.clone() });
        log::info!("peer {peer_id} joined session {session_id:?}");
    }

    /// Deliver `bytes` to every peer in the origin's session except the
    /// origin. Unbound origins are dropped silently. Returns the number of
    /// peers the event was handed to.
    pub fn route(&self, origin: &Uuid, bytes: Arc<Vec<u8>>) -> usize {
        let Some(handle) = self.peers.get(origin) else {
            log::trace!("dropping event from unbound peer {origin}");
            return 0;
        };
        let Some(members) = self.sessions.get(&handle.session) else {
            return 0;
        };

        let mut delivered = 0;
        for peer_id in members {
            if peer_id == origin {
                continue;
            }
            if let Some(peer) = self.peers.get(peer_id) {
                // Fire-and-forget: a closed receiver just loses its copy.
                if peer.sink.send(bytes.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Remove a peer on disconnect; its session is deleted when emptied.
    pub fn leave(&mut self, peer_id: &Uuid) {
        if let Some(handle) = self.peers.remove(peer_id) {
            self.remove_membership(peer_id, &handle.session);
            log::info!("peer {peer_id} left session {:?}", handle.session);
        }
    }

    fn remove_membership(&mut self, peer_id: &Uuid, session_id: &str) {
        if let Some(members) = self.sessions.get_mut(session_id) {
            members.remove(peer_id);
            if members.is_empty() {
                self.sessions.remove(session_id);
                log::debug!("session {session_id:?} removed (empty)");
            }
        }
    }

    /// Session a peer is currently bound to.
    pub fn session_of(&self, peer_id: &Uuid) -> Option<&str> {
        self.peers.get(peer_id).map(|h| h.session.as_str())
    }

    /// Members of a session; empty when the session does not exist.
    pub fn session_peers(&self, session_id: &str) -> Vec<Uuid> {
        self.sessions
            .get(session_id)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}
