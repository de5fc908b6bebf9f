use refbot_discount::LinkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("required configuration missing: {0}")]
    ConfigMissing(&'static str),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("registry error: {0}")]
    Registry(#[from] refbot_registry::RegistryError),

    #[error("store error: {0}")]
    Store(#[from] refbot_store::StoreError),
}

impl SdkError {
    /// Returns `true` if the user can fix their input and try again.
    ///
    /// Boundaries answer these with a corrective prompt; everything else gets
    /// a generic apology and an operator-facing log entry.
    pub fn is_correctable(&self) -> bool {
        matches!(self, Self::Registry(e) if e.is_validation())
    }

    /// Returns `true` if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Registry(e) => e.is_transient(),
            Self::Store(e) => e.is_transient(),
            Self::ConfigMissing(_) | Self::Config(_) => false,
        }
    }
}

impl From<LinkError> for SdkError {
    fn from(err: LinkError) -> Self {
        match err {
            LinkError::ConfigMissing(name) => Self::ConfigMissing(name),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
