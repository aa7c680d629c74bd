// SPDX-License-Identifier: Apache-2.0
//! The one mutex in this process: a single lock guards the session map,
//! the incoming-command queue, and the next-session-id counter, and nothing
//! else is shared-mutable. Grounded on `HubState`
//! (`echo-session-service::main`) — the connection map, monotonic id
//! counter, and per-connection outbox channel carry over almost unchanged;
//! this crate additionally folds the inbound queue into the same guard,
//! collapsing what was a lock-per-map split into one mutex.
//!
//! The simulation [`sim_engine::Engine`] is never touched from here: it
//! lives exclusively inside the tick-loop task (`crate::runtime`), so it
//! needs no lock of its own.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use sim_model::PlayerId;
use tokio::sync::{mpsc, Mutex};

use session_proto::{AuthPayload, ClientCommand};

/// Identifies one live WebSocket connection, independent of whether it has
/// authenticated yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// One inbound message, already decoded, waiting for the tick loop to apply
/// it.
#[derive(Debug)]
pub enum Incoming {
    /// An `auth` envelope.
    Auth {
        /// The session that sent it.
        session: SessionId,
        /// The decoded payload.
        payload: AuthPayload,
    },
    /// A `command` envelope from an already-authenticated session.
    Command {
        /// The session that sent it.
        session: SessionId,
        /// The decoded command.
        command: ClientCommand,
    },
    /// A `policy_update` envelope.
    PolicyUpdate {
        /// The session that sent it.
        session: SessionId,
        /// Updated client-type string, if provided.
        client_type: Option<String>,
    },
    /// A `request_full_state` envelope.
    RequestFullState {
        /// The session that sent it.
        session: SessionId,
    },
    /// The inbound frame failed to decode as any known envelope shape.
    ProtocolError {
        /// The session that sent it.
        session: SessionId,
    },
}

/// Per-session bookkeeping the tick loop and the WebSocket handlers share.
pub struct SessionEntry {
    /// The authenticated player, once `auth` has succeeded.
    pub player_id: Option<PlayerId>,
    /// Self-reported client type, if the session has sent one.
    pub client_type: Option<String>,
    /// Set when a `full_state` resend is owed on the next tick (either the
    /// post-auth resync or an explicit `request_full_state`).
    pub wants_full_state: bool,
    /// Outbound channel drained by this connection's dedicated writer task.
    pub outbox: mpsc::Sender<Vec<u8>>,
}

#[derive(Default)]
struct HubState {
    next_session_id: u64,
    sessions: HashMap<SessionId, SessionEntry>,
    incoming: VecDeque<Incoming>,
}

/// A clonable handle to the single mutex-guarded hub state.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<Mutex<HubState>>,
}

/// A point-in-time copy of one session, enough to address it from the tick
/// loop without holding the hub lock while sending.
pub struct SessionSnapshot {
    /// The session's id.
    pub session: SessionId,
    /// The session's authenticated player, if any.
    pub player_id: Option<PlayerId>,
    /// Whether a full-state resend was pending as of this snapshot; the
    /// pending flag is cleared in the same lock as the snapshot is taken.
    pub wants_full_state: bool,
    /// Clone of the per-connection outbox sender.
    pub outbox: mpsc::Sender<Vec<u8>>,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubState::default())),
        }
    }

    /// Registers a new connection and returns its session id. The new
    /// session always starts owed a full-state resend, delivered once it
    /// authenticates.
    pub async fn connect(&self, outbox: mpsc::Sender<Vec<u8>>) -> SessionId {
        let mut state = self.inner.lock().await;
        let id = SessionId(state.next_session_id);
        state.next_session_id += 1;
        state.sessions.insert(
            id,
            SessionEntry {
                player_id: None,
                client_type: None,
                wants_full_state: false,
                outbox,
            },
        );
        id
    }

    /// Removes a connection's bookkeeping once its socket closes.
    pub async fn disconnect(&self, session: SessionId) {
        let mut state = self.inner.lock().await;
        state.sessions.remove(&session);
    }

    /// Queues a decoded inbound message for the next tick.
    pub async fn push(&self, message: Incoming) {
        let mut state = self.inner.lock().await;
        state.incoming.push_back(message);
    }

    /// Drains every message queued since the last drain, in arrival order.
    pub async fn drain_incoming(&self) -> Vec<Incoming> {
        let mut state = self.inner.lock().await;
        state.incoming.drain(..).collect()
    }

    /// Records that `session` authenticated as `player_id`, and marks it
    /// owed a full-state resend, sent once right after a successful auth.
    pub async fn set_authenticated(&self, session: SessionId, player_id: PlayerId) {
        let mut state = self.inner.lock().await;
        if let Some(entry) = state.sessions.get_mut(&session) {
            entry.player_id = Some(player_id);
            entry.wants_full_state = true;
        }
    }

    /// Updates a session's self-reported client type.
    pub async fn set_client_type(&self, session: SessionId, client_type: Option<String>) {
        let mut state = self.inner.lock().await;
        if let Some(entry) = state.sessions.get_mut(&session) {
            entry.client_type = client_type;
        }
    }

    /// Marks `session` as owed a full-state resend on the next tick.
    pub async fn request_full_state(&self, session: SessionId) {
        let mut state = self.inner.lock().await;
        if let Some(entry) = state.sessions.get_mut(&session) {
            entry.wants_full_state = true;
        }
    }

    /// True if `session` is already authenticated.
    pub async fn is_authenticated(&self, session: SessionId) -> bool {
        let state = self.inner.lock().await;
        state
            .sessions
            .get(&session)
            .is_some_and(|entry| entry.player_id.is_some())
    }

    /// The player `session` authenticated as, if any.
    pub async fn player_of(&self, session: SessionId) -> Option<PlayerId> {
        let state = self.inner.lock().await;
        state.sessions.get(&session).and_then(|entry| entry.player_id)
    }

    /// Sends one encoded frame directly to `session`'s outbox, bypassing the
    /// tick loop (used for immediate `auth_result`/`error` replies).
    pub async fn send_to(&self, session: SessionId, bytes: Vec<u8>) {
        let outbox = {
            let state = self.inner.lock().await;
            state.sessions.get(&session).map(|entry| entry.outbox.clone())
        };
        if let Some(outbox) = outbox {
            let _ = outbox.send(bytes).await;
        }
    }

    /// Snapshots every live session for this tick's delta fan-out, clearing
    /// each session's `wants_full_state` flag as it is read.
    pub async fn snapshot_for_tick(&self) -> Vec<SessionSnapshot> {
        let mut state = self.inner.lock().await;
        state
            .sessions
            .iter_mut()
            .map(|(session, entry)| {
                let wants_full_state = entry.wants_full_state;
                entry.wants_full_state = false;
                SessionSnapshot {
                    session: *session,
                    player_id: entry.player_id,
                    wants_full_state,
                    outbox: entry.outbox.clone(),
                }
            })
            .collect()
    }

    /// Count of currently distinct authenticated sessions, used only for
    /// diagnostics — registration-closed enforcement is based on the
    /// player table's size, not live session count (a player may be
    /// registered but not currently connected).
    pub async fn authenticated_session_count(&self) -> usize {
        let state = self.inner.lock().await;
        state
            .sessions
            .values()
            .filter(|entry| entry.player_id.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_allocates_monotonic_ids() {
        let hub = Hub::new();
        let (tx, _rx) = mpsc::channel(4);
        let a = hub.connect(tx.clone()).await;
        let b = hub.connect(tx).await;
        assert_eq!(a, SessionId(0));
        assert_eq!(b, SessionId(1));
    }

    #[tokio::test]
    async fn drain_incoming_returns_arrival_order_and_empties_the_queue() {
        let hub = Hub::new();
        hub.push(Incoming::RequestFullState {
            session: SessionId(0),
        })
        .await;
        hub.push(Incoming::RequestFullState {
            session: SessionId(1),
        })
        .await;
        let drained = hub.drain_incoming().await;
        assert_eq!(drained.len(), 2);
        assert!(hub.drain_incoming().await.is_empty());
    }

    #[tokio::test]
    async fn authenticating_marks_full_state_owed() {
        let hub = Hub::new();
        let (tx, _rx) = mpsc::channel(4);
        let session = hub.connect(tx).await;
        hub.set_authenticated(session, PlayerId(7)).await;
        let snapshot = hub.snapshot_for_tick().await;
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].wants_full_state);
        let snapshot_again = hub.snapshot_for_tick().await;
        assert!(!snapshot_again[0].wants_full_state);
    }

    #[tokio::test]
    async fn disconnect_removes_the_session() {
        let hub = Hub::new();
        let (tx, _rx) = mpsc::channel(4);
        let session = hub.connect(tx).await;
        hub.disconnect(session).await;
        assert_eq!(hub.snapshot_for_tick().await.len(), 0);
    }
}
