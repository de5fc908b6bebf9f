//! Persistent user record storage for the referral bot.
//!
//! This crate owns the on-disk representation of the user mapping: a single
//! JSON document keyed by user id, guarded by an advisory lock on a sentinel
//! file next to it. Every handler process opens its own store handle on the
//! same path; the lock is what serializes them.
//!
//! # Storage Backends
//!
//! All backends implement the [`RecordStore`] trait:
//!
//! - [`JsonFileStore`] -- the production file-backed store
//! - [`InMemoryRecordStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`TracedStore`] -- logging middleware wrapped around any other backend
//!
//! # Design Rules
//!
//! 1. Every read and every write runs inside one scoped lock acquisition.
//! 2. Writes replace the whole document atomically (temp file + rename).
//! 3. A missing data file is an empty mapping, never an error.
//! 4. Unparseable content is reported, never repaired.
//! 5. Lock contention fails after a bounded wait; the store never retries.

pub mod error;
pub mod json;
pub mod lock;
pub mod memory;
pub mod record;
pub mod traced;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use json::{JsonFileStore, DEFAULT_LOCK_TIMEOUT};
pub use lock::{lock_path_for, FileLock};
pub use memory::InMemoryRecordStore;
pub use record::{count_referred_by, UserMap, UserRecord};
pub use traced::TracedStore;
pub use traits::RecordStore;
