//! The [`UserRegistry`]: domain operations over a [`RecordStore`].

use refbot_store::{count_referred_by, RecordStore, UserMap, UserRecord};
use tracing::{debug, info};

use crate::error::Result;
use crate::validation::validate_registration;

/// A user's record together with the number of users they referred.
///
/// Both values come from the same snapshot of the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferralSummary {
    /// The user's id.
    pub id: String,
    /// The stored record.
    pub record: UserRecord,
    /// How many records name this user as their referrer.
    pub referral_count: usize,
}

/// Registration, lookup and removal of users.
///
/// Generic over the backing store so the same logic runs against the file
/// store in production and the in-memory store in tests.
#[derive(Debug)]
pub struct UserRegistry<S> {
    store: S,
}

impl<S: RecordStore> UserRegistry<S> {
    /// Create a registry over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register user `id`, optionally attributed to `referred_by`.
    ///
    /// Returns `true` if a new record was written and `false` if `id` was
    /// already registered, in which case the stored record is left exactly
    /// as it was. Whether `referred_by` names an existing user is not
    /// checked.
    pub fn register(&self, id: &str, platform_id: i64, referred_by: Option<&str>) -> Result<bool> {
        let telegram_id = validate_registration(id, platform_id, referred_by)?;
        let record = UserRecord {
            telegram_id,
            referred_by: referred_by.map(str::to_owned),
        };

        let inserted = self.store.modify(&mut |users| {
            if users.contains_key(id) {
                return false;
            }
            users.insert(id.to_owned(), record.clone());
            true
        })?;

        if inserted {
            info!(user = id, telegram_id, referred_by, "registered user");
        } else {
            debug!(user = id, "user already registered");
        }
        Ok(inserted)
    }

    /// Look up user `id`.
    pub fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        let mut users = self.store.load()?;
        Ok(users.remove(id))
    }

    /// Returns `true` if user `id` is registered.
    pub fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.store.load()?.contains_key(id))
    }

    /// Number of users whose referrer is `id`.
    ///
    /// Scans every record. `id` does not need to be registered itself: a
    /// removed referrer still counts the referrals pointing at it.
    pub fn count_referrals(&self, id: &str) -> Result<usize> {
        let users = self.store.load()?;
        Ok(count_referred_by(&users, id))
    }

    /// Record and referral count for `id` from a single load.
    pub fn summary(&self, id: &str) -> Result<Option<ReferralSummary>> {
        let users = self.store.load()?;
        Ok(users.get(id).map(|record| ReferralSummary {
            id: id.to_owned(),
            record: record.clone(),
            referral_count: count_referred_by(&users, id),
        }))
    }

    /// All registered users.
    pub fn users(&self) -> Result<UserMap> {
        Ok(self.store.load()?)
    }

    /// Remove user `id`. Returns `true` if a record was deleted.
    ///
    /// Records referred by `id` keep pointing at it.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let removed = self.store.modify(&mut |users| users.remove(id).is_some())?;
        if removed {
            info!(user = id, "removed user");
        } else {
            debug!(user = id, "remove of unknown user ignored");
        }
        Ok(removed)
    }
}
