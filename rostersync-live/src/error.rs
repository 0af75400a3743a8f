//! Error types for the live index.

use crate::locks::LockKey;
use thiserror::Error;

/// Result type for live index operations.
pub type LiveResult<T> = Result<T, LiveError>;

#[derive(Debug, Error)]
pub enum LiveError {
    /// A student lock could not be acquired in time.
    #[error("timed out waiting for the lock on {0}")]
    LockTimeout(LockKey),
}
