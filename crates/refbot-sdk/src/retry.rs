//! Caller-side retry for transient failures.
//!
//! The store never retries on its own. Callers that want retries wrap a call
//! in [`with_retry`] with an explicit [`RetryPolicy`]; only errors that
//! report themselves as [`Transient`] are retried.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use refbot_registry::RegistryError;
use refbot_store::StoreError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::SdkError;

/// Errors that can tell whether retrying might help.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for StoreError {
    fn is_transient(&self) -> bool {
        StoreError::is_transient(self)
    }
}

impl Transient for RegistryError {
    fn is_transient(&self) -> bool {
        RegistryError::is_transient(self)
    }
}

impl Transient for SdkError {
    fn is_transient(&self) -> bool {
        SdkError::is_transient(self)
    }
}

/// Bounded attempts with a fixed delay between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    /// Pause between attempts, in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// A policy making `attempts` tries, `delay` apart.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            delay_ms: 0,
        }
    }

    /// Pause between attempts.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Run `call` under `policy`, retrying transient failures.
///
/// Non-transient errors are returned immediately. After the last attempt the
/// final error is returned as-is.
pub fn with_retry<T, E>(
    policy: &RetryPolicy,
    op: &str,
    mut call: impl FnMut() -> Result<T, E>,
) -> Result<T, E>
where
    E: Transient + Display,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match call() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < attempts => {
                warn!(op, attempt, attempts, error = %e, "transient failure; retrying");
                thread::sleep(policy.delay());
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    error!(op, attempts, error = %e, "giving up after retries");
                }
                return Err(e);
            }
        }
    }
}
