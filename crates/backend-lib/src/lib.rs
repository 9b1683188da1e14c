// ============================
// meetlink-backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the `MeetLink` signaling server.

pub mod config;
pub mod directory;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod relay;
pub mod sessions;
pub mod ws_router;

use crate::config::Settings;
use crate::directory::MeetingDirectory;
use crate::registry::RoomRegistry;
use crate::sessions::SessionTracker;
use std::sync::Arc;

/// Application state shared across all connections
#[derive(Clone)]
pub struct AppState {
    /// In-memory room registry, the only shared mutable resource in the core
    pub registry: Arc<RoomRegistry>,
    /// Per-connection bookkeeping and outbound delivery
    pub sessions: Arc<SessionTracker>,
    /// External host-lookup collaborator
    pub directory: Arc<dyn MeetingDirectory>,
    /// Settings manager
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state
    pub fn new(directory: Arc<dyn MeetingDirectory>, settings: Settings) -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new()),
            sessions: Arc::new(SessionTracker::new()),
            directory,
            settings: Arc::new(settings),
        }
    }
}
