//! High-level API for the referral bot.
//!
//! This is the entry point for the message-handling layer. It wires the
//! user registry, the discount schedule and the link generator together
//! behind [`ReferralService`], loads and validates [`BotConfig`], and applies
//! the caller's [`RetryPolicy`] to transient store failures.

pub mod config;
pub mod error;
pub mod retry;
pub mod service;

pub use config::{BotConfig, ENV_BOT_LINK, ENV_DATA_PATH};
pub use error::{SdkError, SdkResult};
pub use retry::{with_retry, RetryPolicy, Transient};
pub use service::{FileService, Profile, ReferralService, StartOutcome};

// Re-export key types
pub use refbot_discount::{compute_discounts, generate_link, DiscountEntry, Discounts, OrderLabel};
pub use refbot_registry::{RegistryError, UserRegistry};
pub use refbot_store::{JsonFileStore, RecordStore, StoreError, UserMap, UserRecord};
