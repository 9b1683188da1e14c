// ============================
// meetlink-backend-lib/src/directory.rs
// ============================
//! Meeting directory abstraction with flat-file implementation.
//!
//! The directory is the core's only view of the persistent meeting store:
//! a lookup from a meeting code to the host's display name. "No such
//! meeting" is a non-error empty result; host resolution then yields none
//! and end-meeting requests are rejected until a host joins.
use crate::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs as tokio_fs;
use tracing::warn;

/// Derive the canonical meeting code from a room identifier
/// (the last path segment, mirroring the client's routing scheme)
pub fn meeting_code_from_room(room_id: &str) -> &str {
    room_id.rsplit('/').next().unwrap_or(room_id)
}

/// Trait for meeting-lookup backends
#[async_trait]
pub trait MeetingDirectory: Send + Sync {
    /// Resolve the host display name for a meeting code.
    /// Returns `Ok(None)` when no meeting record exists.
    async fn host_name(&self, meeting_code: &str) -> Result<Option<String>, AppError>;
}

/// One meeting record as stored on disk
#[derive(Debug, Deserialize)]
struct MeetingRecord {
    host_name: String,
}

/// Flat-file implementation of the `MeetingDirectory` trait,
/// reading `meetings.json` (meeting code -> record) from the data directory
pub struct FlatFileDirectory {
    path: PathBuf,
}

impl FlatFileDirectory {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            path: data_dir.as_ref().join("meetings.json"),
        }
    }
}

#[async_trait]
impl MeetingDirectory for FlatFileDirectory {
    /// Look up the host display name in `meetings.json`.
    /// A missing or unreadable file degrades to "no meeting".
    async fn host_name(&self, meeting_code: &str) -> Result<Option<String>, AppError> {
        let content = match tokio_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "meeting directory unreadable");
                return Ok(None);
            },
        };

        let records: HashMap<String, MeetingRecord> = serde_json::from_str(&content)?;
        Ok(records.get(meeting_code).map(|r| r.host_name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_meeting_code_from_room() {
        assert_eq!(meeting_code_from_room("/meet/abc-123"), "abc-123");
        assert_eq!(meeting_code_from_room("abc-123"), "abc-123");
        assert_eq!(meeting_code_from_room("/a/b/c"), "c");
    }

    #[tokio::test]
    async fn test_lookup_known_meeting() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("meetings.json"),
            r#"{"abc-123": {"host_name": "Alice"}}"#,
        )
        .unwrap();

        let directory = FlatFileDirectory::new(dir.path());
        let host = directory.host_name("abc-123").await.unwrap();
        assert_eq!(host, Some("Alice".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_meeting_is_none() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("meetings.json"), "{}").unwrap();

        let directory = FlatFileDirectory::new(dir.path());
        assert_eq!(directory.host_name("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let directory = FlatFileDirectory::new(dir.path());
        assert_eq!(directory.host_name("abc-123").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("meetings.json"), "not json").unwrap();

        let directory = FlatFileDirectory::new(dir.path());
        assert!(directory.host_name("abc-123").await.is_err());
    }
}
