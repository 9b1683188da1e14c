// ============================
// meetlink-backend-lib/src/sessions.rs
// ============================
//! Per-connection session bookkeeping and outbound delivery.
use crate::registry::Outbox;
use dashmap::DashMap;
use meetlink_common::{ConnectionId, ServerEvent};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// One participant's live transport session
pub struct PeerSession {
    /// Channel draining into the peer's WebSocket
    pub tx: UnboundedSender<ServerEvent>,
    /// Connect timestamp, used for best-effort session duration on disconnect
    pub connected_at: Instant,
}

/// Tracker for all live connections
pub struct SessionTracker {
    peers: DashMap<ConnectionId, PeerSession>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTracker {
    pub fn new() -> Self {
        SessionTracker {
            peers: DashMap::new(),
        }
    }

    /// Register a connection's outbound channel
    pub fn register(&self, conn: &str, tx: UnboundedSender<ServerEvent>) {
        self.peers.insert(
            conn.to_string(),
            PeerSession {
                tx,
                connected_at: Instant::now(),
            },
        );
    }

    /// Drop a connection's bookkeeping, returning its session duration.
    /// An absent entry yields a zero duration, not an error.
    pub fn unregister(&self, conn: &str) -> Duration {
        self.peers
            .remove(conn)
            .map(|(_, session)| session.connected_at.elapsed())
            .unwrap_or_default()
    }

    /// Number of live connections
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl Outbox for SessionTracker {
    /// Deliver an event to a single connection. A missing peer or a closed
    /// channel is a silent skip: membership snapshots may be briefly stale
    /// under concurrency and the disconnect cascade will catch up.
    fn deliver(&self, to: &str, event: ServerEvent) -> bool {
        match self.peers.get(to) {
            Some(peer) => {
                if peer.tx.send(event).is_err() {
                    debug!(conn = %to, "delivery to closed channel skipped");
                    false
                } else {
                    true
                }
            },
            None => {
                debug!(conn = %to, "delivery to unknown connection skipped");
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_register_deliver_unregister() {
        let tracker = SessionTracker::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tracker.register("c1", tx);
        assert_eq!(tracker.len(), 1);

        assert!(tracker.deliver("c1", ServerEvent::MeetingEnded));
        assert_eq!(rx.recv().await, Some(ServerEvent::MeetingEnded));

        let duration = tracker.unregister("c1");
        assert!(duration >= Duration::ZERO);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_deliver_to_unknown_connection_is_skipped() {
        let tracker = SessionTracker::new();
        assert!(!tracker.deliver("ghost", ServerEvent::MeetingEnded));
    }

    #[test]
    fn test_deliver_to_closed_channel_is_skipped() {
        let tracker = SessionTracker::new();
        let (tx, rx) = mpsc::unbounded_channel();
        tracker.register("c1", tx);
        drop(rx);
        assert!(!tracker.deliver("c1", ServerEvent::MeetingEnded));
    }

    #[test]
    fn test_unregister_unknown_yields_zero_duration() {
        let tracker = SessionTracker::new();
        assert_eq!(tracker.unregister("ghost"), Duration::ZERO);
    }
}
