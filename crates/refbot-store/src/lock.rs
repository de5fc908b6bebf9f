//! Cross-process advisory locking on a sentinel file.
//!
//! The data file itself is never locked: it is replaced by rename on every
//! save, so a lock on it would not survive the write. Instead every store
//! handle locks a companion `<data file>.lock` whose path is derived from the
//! data path alone, so independent processes agree on it without any
//! coordination.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// How long to sleep between acquisition attempts while contended.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Derive the lock sentinel path for a data file: `data.json` -> `data.json.lock`.
pub fn lock_path_for(data_path: &Path) -> PathBuf {
    let mut raw: OsString = data_path.as_os_str().to_os_string();
    raw.push(".lock");
    PathBuf::from(raw)
}

/// An exclusive advisory lock held on a sentinel file.
///
/// The lock is released when the guard is dropped, on every exit path.
/// Locks are tied to the open file description, so two handles in the same
/// process exclude each other exactly like two processes do.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Acquire the lock at `path`, waiting at most `timeout`.
    ///
    /// The sentinel file is created if missing. Fails with
    /// [`StoreError::LockTimeout`] once the bound is exceeded.
    pub fn acquire(path: &Path, timeout: Duration) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let contended = fs2::lock_contended_error().raw_os_error();
        let started = Instant::now();
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    debug!(path = %path.display(), waited = ?started.elapsed(), "lock acquired");
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.raw_os_error() == contended => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        warn!(path = %path.display(), ?waited, "lock acquisition timed out");
                        return Err(StoreError::LockTimeout {
                            path: path.to_path_buf(),
                            waited,
                        });
                    }
                    thread::sleep(POLL_INTERVAL.min(timeout - waited));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Path of the sentinel file this guard holds.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock as well; unlocking first
        // makes the release visible before the file handle is torn down.
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "failed to release lock");
        } else {
            debug!(path = %self.path.display(), "lock released");
        }
    }
}
