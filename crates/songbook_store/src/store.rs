//! Entity store trait definition.

use crate::error::StoreResult;
use songbook_sync_protocol::{EntityKind, Fields, Record, Timestamp};
use std::sync::Arc;

/// A durable collection of records per entity kind.
///
/// # Invariants
///
/// - Every write (`insert`, `put`) stamps `last_modified` with a time strictly
///   greater than any stamp this store issued before
/// - `remove` leaves no trace: a removed record is absent from `get` and
///   from `modified_since`
/// - A write that starts after `checkpoint` returns `t` is stamped after `t`;
///   a write that finished before it is stamped at or before `t`
/// - `modified_since(kind, t)` returns exactly the records of `kind` whose
///   `last_modified > t`, ordered by `(last_modified, id)`
/// - Implementations must be `Send + Sync`; no lock is held between calls
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - JSON snapshot on disk
pub trait EntityStore: Send + Sync {
    /// Checks that the store can be reached.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// when it cannot.
    fn ping(&self) -> StoreResult<()>;

    /// Creates a record with a store-assigned id.
    fn insert(&self, kind: EntityKind, fields: Fields) -> StoreResult<Record>;

    /// Loads a record by id.
    fn get(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Record>>;

    /// Writes a record's complete field set under `id`, creating it if absent.
    fn put(&self, kind: EntityKind, id: &str, fields: Fields) -> StoreResult<Record>;

    /// Removes a record. Returns whether it existed.
    fn remove(&self, kind: EntityKind, id: &str) -> StoreResult<bool>;

    /// Returns records whose `last_modified` is strictly after `since`.
    fn modified_since(&self, kind: EntityKind, since: Timestamp) -> StoreResult<Vec<Record>>;

    /// Returns the number of records of `kind`.
    fn count(&self, kind: EntityKind) -> StoreResult<usize>;

    /// Returns a watermark separating the writes made so far from every
    /// later one.
    fn checkpoint(&self) -> StoreResult<Timestamp>;
}

impl<S: EntityStore + ?Sized> EntityStore for Arc<S> {
    fn ping(&self) -> StoreResult<()> {
        (**self).ping()
    }

    fn insert(&self, kind: EntityKind, fields: Fields) -> StoreResult<Record> {
        (**self).insert(kind, fields)
    }

    fn get(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Record>> {
        (**self).get(kind, id)
    }

    fn put(&self, kind: EntityKind, id: &str, fields: Fields) -> StoreResult<Record> {
        (**self).put(kind, id, fields)
    }

    fn remove(&self, kind: EntityKind, id: &str) -> StoreResult<bool> {
        (**self).remove(kind, id)
    }

    fn modified_since(&self, kind: EntityKind, since: Timestamp) -> StoreResult<Vec<Record>> {
        (**self).modified_since(kind, since)
    }

    fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        (**self).count(kind)
    }

    fn checkpoint(&self) -> StoreResult<Timestamp> {
        (**self).checkpoint()
    }
}
