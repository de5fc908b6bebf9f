//! Error types for registry operations.

use refbot_store::StoreError;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The caller supplied malformed input. Nothing was read or written.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The underlying store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl RegistryError {
    /// Returns `true` if the caller can fix the input and try again.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns `true` if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            Self::Validation { .. } => false,
        }
    }
}

/// Convenience type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
