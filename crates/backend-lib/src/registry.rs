// ============================
// meetlink-backend-lib/src/registry.rs
// ============================
//! In-memory room registry.
//!
//! The registry is the only shared mutable resource in the core. Every
//! operation runs inside the room's `DashMap` entry guard, so a concurrent
//! join, a join racing a disconnect, or a chat append racing a
//! room-deletion-on-empty cannot corrupt the member list or lose a message.
//! Broadcasts that must be ordered per room (membership snapshots, chat,
//! history replay) are performed while the guard is held; delivery goes
//! through the non-blocking [`Outbox`] capability so holding the guard never
//! waits on a peer.
//!
//! Operations on a room that no longer exists degrade to no-ops rather than
//! errors: the design tolerates benign races between disconnect and
//! in-flight messages.

use crate::metrics::{CHAT_RELAYED, MEETING_ENDED, ROOM_ACTIVE, ROOM_JOINED};
use dashmap::DashMap;
use meetlink_common::{ChatEntry, ConnectionId, ServerEvent};
use metrics::{counter, gauge};
use std::collections::HashMap;
use tracing::debug;

/// Send capability for outbound events.
///
/// Returns `false` when the target connection is gone; callers treat that as
/// a silent skip, since membership snapshots may be briefly stale under
/// concurrency.
pub trait Outbox: Send + Sync {
    fn deliver(&self, to: &str, event: ServerEvent) -> bool;
}

/// Live signaling state for one active meeting
#[derive(Debug, Default)]
pub struct Room {
    /// Member connection ids in join order; the order is the host-resolution
    /// tie-break and the broadcast fan-out order
    members: Vec<ConnectionId>,
    names: HashMap<ConnectionId, String>,
    /// Resolved host connection id; unset until a member matching the
    /// meeting's host display name joins
    host: Option<ConnectionId>,
    messages: Vec<ChatEntry>,
}

impl Room {
    /// Append a member and record its display name
    fn add_member(&mut self, conn: &str, display_name: &str) {
        self.members.push(conn.to_string());
        self.names.insert(conn.to_string(), display_name.to_string());
    }

    /// Remove a member; removing a non-member is a no-op
    fn remove_member(&mut self, conn: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != conn);
        self.names.remove(conn);
        if self.host.as_deref() == Some(conn) {
            self.host = None;
        }
        self.members.len() != before
    }

    /// Re-run host resolution: first member (join order) whose display name
    /// matches the meeting's host display name. Re-running on every join is
    /// the reference behavior; two members sharing the host's name reassign
    /// authority on the next join. The policy is isolated here so it can be
    /// swapped without touching the relay.
    fn resolve_host(&mut self, host_name: Option<&str>) {
        self.host = host_name.and_then(|name| {
            self.members
                .iter()
                .find(|m| self.names.get(*m).is_some_and(|n| n == name))
                .cloned()
        });
    }

    fn push_message(&mut self, entry: ChatEntry) {
        self.messages.push(entry);
    }

    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Outcome of an end-meeting request
#[derive(Debug, PartialEq, Eq)]
pub enum EndMeetingOutcome {
    /// Termination broadcast to this many members
    Ended(usize),
    /// Requester is not the resolved host (or no host is resolved)
    Rejected,
}

/// Thread-safe registry of all active rooms, keyed by room identifier
pub struct RoomRegistry {
    rooms: DashMap<String, Room>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        RoomRegistry {
            rooms: DashMap::new(),
        }
    }

    /// Create the room if it does not exist yet
    pub fn ensure_room(&self, room_id: &str) {
        self.rooms.entry(room_id.to_string()).or_default();
    }

    /// Append a member to a room, creating the room on first join.
    /// Atomic with respect to concurrent joins to the same room.
    pub fn add_member(&self, room_id: &str, conn: &str, display_name: &str) {
        let mut room = self.rooms.entry(room_id.to_string()).or_default();
        room.add_member(conn, display_name);
    }

    /// Remove a member from a room, deleting the room when it empties.
    /// Idempotent: removing a non-member (or from a missing room) is a no-op.
    pub fn remove_member(&self, room_id: &str, conn: &str) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.remove_member(conn);
        }
        self.drop_if_empty(room_id);
    }

    /// Append a chat message; silently dropped if the room does not exist
    /// (a race with concurrent teardown is tolerated, not an error)
    pub fn append_message(&self, room_id: &str, entry: ChatEntry) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.push_message(entry);
        } else {
            debug!(room = room_id, "chat append to missing room dropped");
        }
    }

    /// First room whose member list contains the connection, or none
    pub fn find_room_by_member(&self, conn: &str) -> Option<String> {
        self.rooms
            .iter()
            .find(|entry| entry.value().members.iter().any(|m| m == conn))
            .map(|entry| entry.key().clone())
    }

    /// Member list of a room in join order
    pub fn members_of(&self, room_id: &str) -> Option<Vec<ConnectionId>> {
        self.rooms.get(room_id).map(|room| room.members.clone())
    }

    /// Currently resolved host connection id of a room
    pub fn resolved_host(&self, room_id: &str) -> Option<ConnectionId> {
        self.rooms.get(room_id).and_then(|room| room.host.clone())
    }

    /// Number of active rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Join flow: register the member, re-run host resolution, broadcast the
    /// membership snapshot to every member (old and new), then replay the
    /// full chat history to the joiner only. All of it runs under the room's
    /// entry guard so no live chat can slip in ahead of the replay.
    ///
    /// `host_name` is the meeting's host display name, already looked up by
    /// the caller; the registry lock is never held across that I/O.
    ///
    /// Returns the resolved host connection id, if any.
    pub fn join(
        &self,
        room_id: &str,
        conn: &str,
        display_name: &str,
        host_name: Option<&str>,
        out: &dyn Outbox,
    ) -> Option<ConnectionId> {
        let mut room = self.rooms.entry(room_id.to_string()).or_default();
        let created = room.is_empty();

        room.add_member(conn, display_name);
        room.resolve_host(host_name);

        let snapshot = ServerEvent::UserJoined {
            member: conn.to_string(),
            members: room.members.clone(),
            names: room.names.clone(),
            host_name: host_name.map(str::to_string),
            host: room.host.clone(),
        };
        for member in &room.members {
            out.deliver(member, snapshot.clone());
        }

        for entry in &room.messages {
            out.deliver(
                conn,
                ServerEvent::ChatMessage {
                    payload: entry.payload.clone(),
                    sender: entry.sender.clone(),
                    from: entry.from.clone(),
                },
            );
        }

        let host = room.host.clone();
        drop(room);

        counter!(ROOM_JOINED).increment(1);
        if created {
            gauge!(ROOM_ACTIVE).increment(1.0);
        }
        host
    }

    /// Chat flow: resolve the sender's current room, append the message and
    /// broadcast it to every member (sender included) under the room's
    /// entry guard, preserving per-room ordering.
    ///
    /// Returns `false` when the sender is not a member of any room; the
    /// message is then silently dropped.
    pub fn relay_chat(&self, from: &str, sender: &str, payload: &str, out: &dyn Outbox) -> bool {
        let Some(room_id) = self.find_room_by_member(from) else {
            return false;
        };

        // The room may have been torn down between lookup and lock; that
        // race is tolerated and the message is dropped.
        let Some(mut room) = self.rooms.get_mut(&room_id) else {
            return false;
        };

        room.push_message(ChatEntry {
            sender: sender.to_string(),
            payload: payload.to_string(),
            from: from.to_string(),
        });

        let event = ServerEvent::ChatMessage {
            payload: payload.to_string(),
            sender: sender.to_string(),
            from: from.to_string(),
        };
        for member in &room.members {
            out.deliver(member, event.clone());
        }
        drop(room);

        counter!(CHAT_RELAYED).increment(1);
        true
    }

    /// Disconnect flow: for every room containing the connection, broadcast
    /// a member-left event to the remaining members, then remove the
    /// connection, deleting the room when it empties. A departing host's
    /// pointer is cleared; the next join re-resolves it.
    ///
    /// Returns the ids of the rooms the connection was removed from.
    pub fn remove_connection(&self, conn: &str, out: &dyn Outbox) -> Vec<String> {
        let room_ids: Vec<String> = self
            .rooms
            .iter()
            .filter(|entry| entry.value().members.iter().any(|m| m == conn))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed_from = Vec::new();
        for room_id in room_ids {
            if let Some(mut room) = self.rooms.get_mut(&room_id) {
                if room.remove_member(conn) {
                    let event = ServerEvent::UserLeft {
                        member: conn.to_string(),
                    };
                    for member in &room.members {
                        out.deliver(member, event.clone());
                    }
                    removed_from.push(room_id.clone());
                }
            }
            self.drop_if_empty(&room_id);
        }
        removed_from
    }

    /// Meeting-end gate: only the currently resolved host connection may
    /// terminate the meeting. Rejection is surfaced to the requester only;
    /// success broadcasts to every current member. An unknown room or an
    /// unresolved host both reject.
    pub fn end_meeting(
        &self,
        room_id: &str,
        requester: &str,
        out: &dyn Outbox,
    ) -> EndMeetingOutcome {
        let Some(room) = self.rooms.get_mut(room_id) else {
            out.deliver(
                requester,
                ServerEvent::Error {
                    message: "Only the host can end the meeting".to_string(),
                },
            );
            return EndMeetingOutcome::Rejected;
        };

        if room.host.as_deref() != Some(requester) {
            drop(room);
            out.deliver(
                requester,
                ServerEvent::Error {
                    message: "Only the host can end the meeting".to_string(),
                },
            );
            return EndMeetingOutcome::Rejected;
        }

        for member in &room.members {
            out.deliver(member, ServerEvent::MeetingEnded);
        }
        let count = room.members.len();
        drop(room);

        counter!(MEETING_ENDED).increment(1);
        EndMeetingOutcome::Ended(count)
    }

    fn drop_if_empty(&self, room_id: &str) {
        if self
            .rooms
            .remove_if(room_id, |_, room| room.is_empty())
            .is_some()
        {
            gauge!(ROOM_ACTIVE).decrement(1.0);
            debug!(room = room_id, "room deleted (empty)");
        }
    }
}
