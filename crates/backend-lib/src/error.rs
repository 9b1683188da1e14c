// ============================
// meetlink-backend-lib/src/error.rs
// ============================
//! Central error type for the signaling core.
//!
//! Nothing here is user-facing: the relay absorbs every recoverable
//! condition as a silent no-op, so these variants surface only in
//! logs and at the binary boundary.
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Meeting directory error: {0}")]
    Directory(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for AppError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        AppError::Internal("Failed to send message".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let dir_err = AppError::Directory("meetings.json unreadable".to_string());
        assert_eq!(
            dir_err.to_string(),
            "Meeting directory error: meetings.json unreadable"
        );

        let io_err = AppError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "File not found",
        ));
        assert!(io_err.to_string().contains("IO error"));
    }

    #[test]
    fn test_error_from_impls() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Json(_)));

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<u8>();
        drop(rx);
        let send_err = tx.send(1).unwrap_err();
        let app_err: AppError = send_err.into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }
}
