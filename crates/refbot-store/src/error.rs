use std::path::PathBuf;
use std::time::Duration;

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The lock sentinel could not be acquired within the configured bound.
    #[error("timed out after {waited:?} waiting for lock {path}")]
    LockTimeout { path: PathBuf, waited: Duration },

    /// The backing document could not be parsed or produced.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An in-process lock guarding the backend was poisoned by a panic.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

impl StoreError {
    /// Returns `true` for failures a caller may reasonably retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
