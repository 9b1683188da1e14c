// ============================
// meetlink-backend-lib/src/relay.rs
// ============================
//! Signaling Relay Module
//!
//! Per-connection event router for the meeting coordination core. One
//! `SignalingHandler` is instantiated per WebSocket connection and routes
//! the join / signal / chat / end-meeting / disconnect protocol against the
//! shared room registry.
//!
//! # Failure semantics
//! Protocol misuse (empty room id on join, empty target id on signal, chat
//! from a connection that is in no room) is absorbed as a silent no-op and
//! logged at debug; the only user-facing error event is the authorization
//! failure on meeting termination. Collaborator failures during host lookup
//! degrade to an unresolved host, never to a failed join.
//!
//! # Concurrency
//! The host lookup is collaborator I/O and runs before any registry lock is
//! taken; the registry's own operations are short critical sections with
//! non-blocking fan-out (see `registry`).

use crate::directory::meeting_code_from_room;
use crate::registry::{EndMeetingOutcome, Outbox};
use crate::AppState;
use meetlink_common::{ClientEvent, ConnectionId, ServerEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Handler for one connection's signaling events
pub struct SignalingHandler {
    state: Arc<AppState>,
    conn_id: ConnectionId,
}

impl SignalingHandler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            conn_id: Uuid::new_v4().to_string(),
        }
    }

    /// This connection's identifier
    pub fn conn_id(&self) -> &str {
        &self.conn_id
    }

    /// Route one inbound event
    pub async fn handle_event(&self, event: ClientEvent) {
        match event {
            ClientEvent::JoinCall { room, display_name } => {
                self.handle_join(&room, &display_name).await;
            },
            ClientEvent::Signal { to, payload } => {
                if to.is_empty() {
                    debug!(conn = %self.conn_id, "signal with empty target ignored");
                    return;
                }
                // No membership validation on this path: the target is
                // trusted to come from a prior membership snapshot.
                self.state.sessions.deliver(
                    &to,
                    ServerEvent::Signal {
                        from: self.conn_id.clone(),
                        payload,
                    },
                );
            },
            ClientEvent::ChatMessage { payload, sender } => {
                let relayed = self.state.registry.relay_chat(
                    &self.conn_id,
                    &sender,
                    &payload,
                    self.state.sessions.as_ref(),
                );
                if !relayed {
                    debug!(conn = %self.conn_id, "chat from connection outside any room dropped");
                }
            },
            ClientEvent::EndMeeting { requester, room } => {
                let outcome =
                    self.state
                        .registry
                        .end_meeting(&room, &requester, self.state.sessions.as_ref());
                match outcome {
                    EndMeetingOutcome::Ended(members) => {
                        info!(room = %room, members, "meeting ended by host");
                    },
                    EndMeetingOutcome::Rejected => {
                        debug!(room = %room, requester = %requester, "end-meeting rejected");
                    },
                }
            },
        }
    }

    async fn handle_join(&self, room: &str, display_name: &str) {
        if room.is_empty() {
            debug!(conn = %self.conn_id, "join with empty room id ignored");
            return;
        }

        // Collaborator I/O happens before the registry critical section.
        let meeting_code = meeting_code_from_room(room);
        let host_name = match self.state.directory.host_name(meeting_code).await {
            Ok(host_name) => host_name,
            Err(e) => {
                warn!(code = meeting_code, error = %e, "host lookup failed, host unresolved");
                None
            },
        };

        let host = self.state.registry.join(
            room,
            &self.conn_id,
            display_name,
            host_name.as_deref(),
            self.state.sessions.as_ref(),
        );
        info!(
            conn = %self.conn_id,
            room = %room,
            name = display_name,
            host = host.as_deref().unwrap_or("unresolved"),
            "joined room"
        );
    }

    /// Transport teardown: broadcast member-left to the remaining members of
    /// every room containing this connection, remove it (deleting emptied
    /// rooms), then discard the session bookkeeping.
    pub fn handle_disconnect(&self) {
        let rooms = self
            .state
            .registry
            .remove_connection(&self.conn_id, self.state.sessions.as_ref());
        let duration = self.state.sessions.unregister(&self.conn_id);
        info!(
            conn = %self.conn_id,
            rooms = rooms.len(),
            duration_secs = duration.as_secs(),
            "disconnected"
        );
    }
}
