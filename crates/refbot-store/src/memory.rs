use std::sync::{Mutex, MutexGuard};

use crate::error::{StoreError, StoreResult};
use crate::record::UserMap;
use crate::traits::RecordStore;

/// In-memory, `BTreeMap`-based record store.
///
/// Intended for tests and embedding. The mapping lives behind a `Mutex`, which
/// plays the role the sentinel lock plays for [`crate::JsonFileStore`]:
/// `modify` holds it across the whole read-decide-write cycle.
pub struct InMemoryRecordStore {
    users: Mutex<UserMap>,
}

impl InMemoryRecordStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::with_users(UserMap::new())
    }

    /// Create a store pre-populated with `users`.
    pub fn with_users(users: UserMap) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.guard()?.len())
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn guard(&self) -> StoreResult<MutexGuard<'_, UserMap>> {
        self.users
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn load(&self) -> StoreResult<UserMap> {
        Ok(self.guard()?.clone())
    }

    fn save(&self, users: &UserMap) -> StoreResult<()> {
        *self.guard()? = users.clone();
        Ok(())
    }

    fn modify(&self, apply: &mut dyn FnMut(&mut UserMap) -> bool) -> StoreResult<bool> {
        let mut users = self.guard()?;
        // Work on a copy so a declined change leaves the stored map untouched.
        let mut draft = users.clone();
        let changed = apply(&mut draft);
        if changed {
            *users = draft;
        }
        Ok(changed)
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRecordStore")
            .field("user_count", &self.len().ok())
            .finish()
    }
}
