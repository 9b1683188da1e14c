// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between `MeetLink` clients and the signaling server.
//! This module defines the WebSocket protocol events and supporting types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque identifier for one live transport session (one per open tab/device).
pub type ConnectionId = String;

/// Events sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "msgType")]
pub enum ClientEvent {
    /// Join a meeting room
    /// # Fields
    /// * `room` - Room path; the last path segment is the meeting code
    /// * `display_name` - Self-reported display name, not authenticated
    JoinCall {
        room: String,
        display_name: String,
    },
    /// Relay a WebRTC negotiation payload to a single peer
    /// # Fields
    /// * `to` - Target connection id from a prior membership snapshot
    /// * `payload` - Opaque offer/answer/ICE blob, forwarded untouched
    Signal {
        to: ConnectionId,
        payload: serde_json::Value,
    },
    /// Send a chat message to the sender's current room
    ChatMessage {
        payload: String,
        sender: String,
    },
    /// Request termination of a meeting (host only)
    /// # Fields
    /// * `requester` - Connection id claiming host authority
    /// * `room` - Room path of the meeting to end
    EndMeeting {
        requester: ConnectionId,
        room: String,
    },
}

/// Events sent from server to one or more clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "msgType")]
pub enum ServerEvent {
    /// Membership snapshot, broadcast to every member (old and new) on join
    UserJoined {
        /// Connection id of the member that just joined
        member: ConnectionId,
        /// Full member list in join order
        members: Vec<ConnectionId>,
        /// Connection id -> display name
        names: HashMap<ConnectionId, String>,
        /// Display name of the meeting's host, if the meeting is known
        host_name: Option<String>,
        /// Resolved host connection id, if a matching member is present
        host: Option<ConnectionId>,
    },
    /// Targeted relay of a WebRTC negotiation payload
    Signal {
        from: ConnectionId,
        payload: serde_json::Value,
    },
    /// Chat message, used both for live broadcast and history replay
    ChatMessage {
        payload: String,
        sender: String,
        from: ConnectionId,
    },
    /// A member's transport session ended
    UserLeft {
        member: ConnectionId,
    },
    /// The host ended the meeting
    MeetingEnded,
    /// Authorization failure, sent to the requester only
    Error {
        message: String,
    },
}

/// One relayed chat event as stored in a room's history
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatEntry {
    /// Sender display name as supplied with the message
    pub sender: String,
    /// Opaque message payload
    pub payload: String,
    /// Origin connection id
    pub from: ConnectionId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_serialization() {
        let join = ClientEvent::JoinCall {
            room: "/meet/abc-123".to_string(),
            display_name: "Alice".to_string(),
        };

        let json = serde_json::to_string(&join).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["msgType"], "JoinCall");
        assert_eq!(parsed["room"], "/meet/abc-123");
        assert_eq!(parsed["display_name"], "Alice");

        let parsed_event: ClientEvent = serde_json::from_str(&json).unwrap();
        match parsed_event {
            ClientEvent::JoinCall { room, display_name } => {
                assert_eq!(room, "/meet/abc-123");
                assert_eq!(display_name, "Alice");
            },
            other => panic!("Wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_server_event_round_trip() {
        let snapshot = ServerEvent::UserJoined {
            member: "c1".to_string(),
            members: vec!["c1".to_string()],
            names: HashMap::from([("c1".to_string(), "Alice".to_string())]),
            host_name: Some("Alice".to_string()),
            host: Some("c1".to_string()),
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ServerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_unknown_msg_type_is_rejected() {
        let err = serde_json::from_str::<ClientEvent>(r#"{"msgType":"Nope"}"#);
        assert!(err.is_err());
    }
}
