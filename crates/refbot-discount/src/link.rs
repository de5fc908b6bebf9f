//! Referral link generation.
//!
//! A referral link is the bot's base link with the inviting user's platform
//! id carried in the `start` query parameter. When an invited user follows
//! it, the platform hands that value back as the argument of the start
//! command, which is how the referrer is attributed.

use crate::error::LinkError;

/// Build the referral link for `platform_id` on top of `base_link`.
///
/// The base link is used verbatim; no escaping or validation is applied.
///
/// # Examples
///
/// ```
/// use refbot_discount::generate_link;
///
/// assert_eq!(
///     generate_link(12345, "https://t.me/example_bot"),
///     "https://t.me/example_bot?start=12345"
/// );
/// ```
pub fn generate_link(platform_id: u64, base_link: &str) -> String {
    format!("{base_link}?start={platform_id}")
}

/// Link generator bound to a base link that was checked once, up front.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferralLinkGenerator {
    base_link: String,
}

impl ReferralLinkGenerator {
    /// Create a generator, failing with [`LinkError::ConfigMissing`] if the
    /// base link is empty or whitespace.
    pub fn new(base_link: impl Into<String>) -> Result<Self, LinkError> {
        let base_link = base_link.into();
        if base_link.trim().is_empty() {
            return Err(LinkError::ConfigMissing("bot_link"));
        }
        Ok(Self { base_link })
    }

    /// Create a generator from an optional configured value.
    pub fn from_config(base_link: Option<&str>) -> Result<Self, LinkError> {
        match base_link {
            Some(link) => Self::new(link),
            None => Err(LinkError::ConfigMissing("bot_link")),
        }
    }

    /// The configured base link.
    pub fn base_link(&self) -> &str {
        &self.base_link
    }

    /// Referral link for `platform_id`.
    pub fn generate(&self, platform_id: u64) -> String {
        generate_link(platform_id, &self.base_link)
    }
}
