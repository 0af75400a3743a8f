//! Error types for the sync layer.

use rostersync_live::LiveError;
use rostersync_store::StoreError;
use rostersync_types::SessionId;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a sync.
///
/// Entries that merely fail to resolve are not errors; they are recorded in
/// the [`SyncLog`](crate::SyncLog) and downgrade the outcome instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Live index error (lock timeout).
    #[error("live index error: {0}")]
    Live(#[from] LiveError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The academic session does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
