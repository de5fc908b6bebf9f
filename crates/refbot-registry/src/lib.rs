//! User registry for the referral bot.
//!
//! This crate provides the domain operations on top of a [`RecordStore`]:
//! registering a user (optionally attributed to a referrer), looking users
//! up, counting how many users a given user brought in, and removing users.
//!
//! # Rules
//!
//! - Input is validated before any I/O. Invalid input never reaches the store.
//! - Registration is idempotent: an existing record is never overwritten, so
//!   referral attribution cannot be changed after the fact.
//! - Every mutation is a single [`RecordStore::modify`] call, so the
//!   existence check and the write share one critical section.
//! - Removal does not cascade. Users referred by a removed user keep their
//!   `referred_by` value.
//!
//! # Modules
//!
//! - [`error`]: Error types for registry operations
//! - [`validation`]: Input checks for ids, platform ids and referrers
//! - [`registry`]: The [`UserRegistry`] itself
//!
//! [`RecordStore`]: refbot_store::RecordStore
//! [`RecordStore::modify`]: refbot_store::RecordStore::modify

pub mod error;
pub mod registry;
pub mod validation;

pub use error::{RegistryError, Result};
pub use registry::{ReferralSummary, UserRegistry};
pub use validation::{validate_platform_id, validate_referrer, validate_registration, validate_user_id};
