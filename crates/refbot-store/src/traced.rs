//! Logging middleware for record stores.
//!
//! [`TracedStore`] wraps any [`RecordStore`] and emits one `tracing` event per
//! call with its outcome and latency. It adds no behavior of its own, so it
//! can be layered over a file store in production and dropped in tests.

use std::time::Instant;

use tracing::{debug, error, warn, Level};

use crate::error::{StoreError, StoreResult};
use crate::record::UserMap;
use crate::traits::RecordStore;

/// A [`RecordStore`] that logs every call made through it.
#[derive(Debug)]
pub struct TracedStore<S> {
    inner: S,
    label: String,
}

impl<S: RecordStore> TracedStore<S> {
    /// Wrap `inner`, tagging its log events with `label`.
    pub fn new(inner: S, label: impl Into<String>) -> Self {
        Self {
            inner,
            label: label.into(),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap, returning the inner store.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn observe<T>(&self, op: &'static str, call: impl FnOnce() -> StoreResult<T>) -> StoreResult<T> {
        let started = Instant::now();
        let result = call();
        let elapsed = started.elapsed();
        match &result {
            Ok(_) => debug!(store = %self.label, op, ?elapsed, "store call succeeded"),
            Err(e) if failure_level(e) == Level::WARN => {
                warn!(store = %self.label, op, ?elapsed, error = %e, "store call failed")
            }
            Err(e) => error!(store = %self.label, op, ?elapsed, error = %e, "store call failed"),
        }
        result
    }
}

/// `WARN` for failures a retry may clear, `ERROR` for the rest.
fn failure_level(err: &StoreError) -> Level {
    if err.is_transient() {
        Level::WARN
    } else {
        Level::ERROR
    }
}

impl<S: RecordStore> RecordStore for TracedStore<S> {
    fn load(&self) -> StoreResult<UserMap> {
        self.observe("load", || self.inner.load())
    }

    fn save(&self, users: &UserMap) -> StoreResult<()> {
        self.observe("save", || self.inner.save(users))
    }

    fn modify(&self, apply: &mut dyn FnMut(&mut UserMap) -> bool) -> StoreResult<bool> {
        self.observe("modify", || self.inner.modify(apply))
    }
}
