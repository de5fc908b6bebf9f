use crate::error::StoreResult;
use crate::record::UserMap;

/// Whole-document user record store.
///
/// All implementations must satisfy these invariants:
/// - `load` never observes a partially written document.
/// - `save` replaces the entire document; readers see either the old or the
///   new mapping, never a mix.
/// - Every call is its own critical section, and `modify` keeps the read,
///   the decision and the write inside a single one.
/// - All I/O errors are propagated, never silently ignored.
pub trait RecordStore: Send + Sync {
    /// Read the full current mapping.
    ///
    /// Returns an empty mapping if nothing has been stored yet.
    fn load(&self) -> StoreResult<UserMap>;

    /// Replace the full mapping.
    fn save(&self, users: &UserMap) -> StoreResult<()>;

    /// Load, apply `apply`, and save if it reports a change.
    ///
    /// `apply` returns `true` when it mutated the mapping. The lock is held
    /// from before the load until after the save, so concurrent writers
    /// cannot interleave between the decision and the write. Returns
    /// whatever `apply` returned.
    fn modify(&self, apply: &mut dyn FnMut(&mut UserMap) -> bool) -> StoreResult<bool>;
}
