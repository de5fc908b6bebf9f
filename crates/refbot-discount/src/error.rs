use thiserror::Error;

/// Errors from building a [`crate::ReferralLinkGenerator`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    /// The base invitation link was not configured.
    #[error("required configuration missing: {0}")]
    ConfigMissing(&'static str),
}
