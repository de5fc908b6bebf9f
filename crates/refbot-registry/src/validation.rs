//! Input validation for registry writes.
//!
//! A registration is valid when:
//! - the user id is non-empty
//! - the platform id is strictly positive
//! - the referrer, if given, is non-empty and is not the user themselves

use crate::error::{RegistryError, Result};

/// Validate a user id.
///
/// # Examples
///
/// ```
/// use refbot_registry::validation::validate_user_id;
///
/// assert!(validate_user_id("123456").is_ok());
/// assert!(validate_user_id("").is_err());
/// ```
pub fn validate_user_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(RegistryError::Validation {
            field: "id",
            reason: "user id must not be empty".into(),
        });
    }
    Ok(())
}

/// Validate a platform id, returning it as the unsigned value that is stored.
pub fn validate_platform_id(platform_id: i64) -> Result<u64> {
    match u64::try_from(platform_id) {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(RegistryError::Validation {
            field: "platform_id",
            reason: format!("platform id must be positive, got {platform_id}"),
        }),
    }
}

/// Validate the referrer of user `id`.
pub fn validate_referrer(id: &str, referrer: Option<&str>) -> Result<()> {
    let Some(referrer) = referrer else {
        return Ok(());
    };
    if referrer.is_empty() {
        return Err(RegistryError::Validation {
            field: "referred_by",
            reason: "referrer must be absent or a non-empty user id".into(),
        });
    }
    if referrer == id {
        return Err(RegistryError::Validation {
            field: "referred_by",
            reason: format!("user {id} cannot refer themselves"),
        });
    }
    Ok(())
}

/// Validate a full registration. Returns the platform id to store.
pub fn validate_registration(id: &str, platform_id: i64, referrer: Option<&str>) -> Result<u64> {
    validate_user_id(id)?;
    let platform_id = validate_platform_id(platform_id)?;
    validate_referrer(id, referrer)?;
    Ok(platform_id)
}
