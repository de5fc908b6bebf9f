//! The production [`RecordStore`]: one pretty-printed JSON document on disk.
//!
//! On-disk format:
//! ```text
//! {
//!     "<id>": {
//!         "telegram_id": <positive integer>,
//!         "referred_by": "<id>" | null
//!     },
//!     ...
//! }
//! ```
//!
//! Keys are sorted, indentation is four spaces and non-ASCII text is written
//! verbatim, so `save(load())` reproduces the file byte for byte.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::lock::{lock_path_for, FileLock};
use crate::record::UserMap;
use crate::traits::RecordStore;

/// Lock acquisition bound used by [`JsonFileStore::open`].
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// File-backed user store guarded by a sentinel lock.
///
/// Handles are cheap and stateless beyond their paths: every operation
/// re-reads the file under the lock, so any number of handles (in any number
/// of processes) can share one data file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl JsonFileStore {
    /// Open a store at `path` with the default lock timeout.
    ///
    /// The parent directory is created if missing; the data file itself is
    /// only created by the first save.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::with_lock_timeout(path, DEFAULT_LOCK_TIMEOUT)
    }

    /// Open a store at `path` that waits at most `lock_timeout` for the lock.
    pub fn with_lock_timeout(path: impl AsRef<Path>, lock_timeout: Duration) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            lock_path: lock_path_for(&path),
            path,
            lock_timeout,
        })
    }

    /// Path of the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the lock sentinel.
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Maximum time an operation waits for the lock.
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    fn lock(&self) -> StoreResult<FileLock> {
        FileLock::acquire(&self.lock_path, self.lock_timeout)
    }

    /// Read the document. The guard argument proves the caller holds the lock.
    fn read_locked(&self, _guard: &FileLock) -> StoreResult<UserMap> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(UserMap::new()),
            Err(e) => return Err(e.into()),
        };
        let users: UserMap = serde_json::from_slice(&bytes)?;
        debug!(path = %self.path.display(), users = users.len(), "loaded user map");
        Ok(users)
    }

    /// Replace the document via a temp file in the same directory and rename.
    fn write_locked(&self, _guard: &FileLock, users: &UserMap) -> StoreResult<()> {
        let bytes = encode(users)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = self.temp_file_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %self.path.display(), users = users.len(), bytes = bytes.len(), "saved user map");
        Ok(())
    }

    /// Temp file that replaces the data file on persist.
    ///
    /// Carries the current data file's permissions so a save never narrows
    /// access to a shared store. A first save gets the umask default.
    fn temp_file_in(&self, dir: &Path) -> StoreResult<NamedTempFile> {
        match fs::metadata(&self.path) {
            Ok(meta) => {
                let tmp = NamedTempFile::new_in(dir)?;
                tmp.as_file().set_permissions(meta.permissions())?;
                Ok(tmp)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(fresh_temp_file_in(dir)?),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn fresh_temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    tempfile::Builder::new()
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn fresh_temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    NamedTempFile::new_in(dir)
}

/// Serialize a mapping exactly as it is written to disk.
pub(crate) fn encode(users: &UserMap) -> StoreResult<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    users.serialize(&mut ser)?;
    Ok(buf)
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> StoreResult<UserMap> {
        let guard = self.lock()?;
        self.read_locked(&guard)
    }

    fn save(&self, users: &UserMap) -> StoreResult<()> {
        let guard = self.lock()?;
        self.write_locked(&guard, users)
    }

    fn modify(&self, apply: &mut dyn FnMut(&mut UserMap) -> bool) -> StoreResult<bool> {
        let guard = self.lock()?;
        let mut users = self.read_locked(&guard)?;
        let changed = apply(&mut users);
        if changed {
            self.write_locked(&guard, &users)?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::UserRecord;
    use std::sync::Arc;
    use std::thread;

    fn sample() -> UserMap {
        let mut users = UserMap::new();
        users.insert("100".into(), UserRecord::new(100));
        users.insert("200".into(), UserRecord::referred(200, "100"));
        users
    }

    fn temp_store() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("data").join("data.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_file_loads_empty() {
        let (_dir, store) = temp_store();
        assert!(store.load().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn open_creates_parent_directory() {
        let (dir, store) = temp_store();
        assert!(dir.path().join("data").is_dir());
        assert_eq!(store.lock_timeout(), DEFAULT_LOCK_TIMEOUT);
        assert_eq!(store.lock_path(), dir.path().join("data").join("data.json.lock"));
    }

    #[test]
    fn save_then_load() {
        let (_dir, store) = temp_store();
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn save_of_load_is_byte_stable() {
        let (_dir, store) = temp_store();
        store.save(&sample()).unwrap();
        let before = fs::read(store.path()).unwrap();

        let loaded = store.load().unwrap();
        store.save(&loaded).unwrap();
        let after = fs::read(store.path()).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn document_layout_matches_format() {
        let (_dir, store) = temp_store();
        let mut users = UserMap::new();
        users.insert("7".into(), UserRecord::new(7));
        store.save(&users).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            text,
            "{\n    \"7\": {\n        \"telegram_id\": 7,\n        \"referred_by\": null\n    }\n}"
        );
    }

    #[test]
    fn non_ascii_is_written_verbatim() {
        let (_dir, store) = temp_store();
        let mut users = UserMap::new();
        users.insert("пользователь".into(), UserRecord::referred(5, "друг"));
        store.save(&users).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"пользователь\""));
        assert!(text.contains("\"друг\""));
        assert!(!text.contains("\\u"));
        assert_eq!(store.load().unwrap(), users);
    }

    #[test]
    fn unparseable_content_is_serialization_error() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), b"{ not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Serialization(_))));

        fs::write(store.path(), b"").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn lock_is_released_after_failed_load() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), b"[]").unwrap();
        assert!(store.load().is_err());

        // A fresh acquisition must not block on a leaked guard.
        assert!(FileLock::acquire(store.lock_path(), Duration::from_millis(50)).is_ok());
    }

    #[test]
    fn lock_is_released_after_failed_save() {
        let (_dir, store) = temp_store();
        // A directory at the data path makes the final rename fail.
        fs::create_dir(store.path()).unwrap();
        assert!(matches!(store.save(&sample()), Err(StoreError::Io(_))));
        assert!(matches!(
            store.modify(&mut |users| users.insert("1".into(), UserRecord::new(1)).is_none()),
            Err(StoreError::Io(_))
        ));

        assert!(FileLock::acquire(store.lock_path(), Duration::from_millis(50)).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn save_keeps_existing_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = temp_store();
        for mode in [0o644, 0o640] {
            store.save(&sample()).unwrap();
            fs::set_permissions(store.path(), fs::Permissions::from_mode(mode)).unwrap();

            store.save(&UserMap::new()).unwrap();
            let after = fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
            assert_eq!(after, mode, "save changed mode {mode:o} to {after:o}");
        }
    }

    #[test]
    fn pre_held_lock_fails_load_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let store = JsonFileStore::with_lock_timeout(&path, Duration::from_millis(100)).unwrap();
        let _held = FileLock::acquire(store.lock_path(), Duration::from_secs(1)).unwrap();

        let err = store.load().unwrap_err();
        assert!(err.is_transient(), "expected LockTimeout, got: {err}");
        let err = store.save(&sample()).unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn modify_skips_write_when_unchanged() {
        let (_dir, store) = temp_store();
        let changed = store.modify(&mut |_users| false).unwrap();
        assert!(!changed);
        assert!(!store.path().exists());
    }

    #[test]
    fn modify_persists_change() {
        let (_dir, store) = temp_store();
        store.save(&sample()).unwrap();

        let changed = store
            .modify(&mut |users| users.remove("100").is_some())
            .unwrap();
        assert!(changed);

        let users = store.load().unwrap();
        assert_eq!(users.len(), 1);
        // Removing a referrer leaves its referrals pointing at it.
        assert!(users["200"].is_referred_by("100"));
    }

    #[test]
    fn independent_handles_do_not_lose_inserts() {
        let dir = tempfile::tempdir().unwrap();
        let path = Arc::new(dir.path().join("data.json"));
        let writers = 16;

        let handles: Vec<_> = (0..writers)
            .map(|i| {
                let path = Arc::clone(&path);
                thread::spawn(move || {
                    let store =
                        JsonFileStore::with_lock_timeout(path.as_path(), Duration::from_secs(30))
                            .unwrap();
                    store
                        .modify(&mut |users| {
                            users.insert(format!("user-{i}"), UserRecord::new(i + 1));
                            true
                        })
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let users = JsonFileStore::open(path.as_path()).unwrap().load().unwrap();
        assert_eq!(users.len(), writers as usize);
        for i in 0..writers {
            assert!(users.contains_key(&format!("user-{i}")));
        }
    }
}
