//! Fault injection for store-dependent tests.

use parking_lot::RwLock;
use songbook_store::{EntityStore, StoreError, StoreResult};
use songbook_sync_protocol::{EntityKind, Fields, Record, Timestamp};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Wraps a store and fails calls on demand.
///
/// - offline: every call, `ping` included, fails with
///   [`StoreError::Unavailable`]
/// - failing ids: reads and writes of those ids fail with
///   [`StoreError::Corrupted`]
/// - failing feed: `modified_since` fails
///
/// Writes that reach the inner store are counted.
pub struct FlakyStore {
    inner: Arc<dyn EntityStore>,
    offline: AtomicBool,
    feed_broken: AtomicBool,
    failing_ids: RwLock<HashSet<String>>,
    writes: AtomicUsize,
}

impl FlakyStore {
    /// Wraps `inner`, initially healthy.
    pub fn new(inner: Arc<dyn EntityStore>) -> Self {
        Self {
            inner,
            offline: AtomicBool::new(false),
            feed_broken: AtomicBool::new(false),
            failing_ids: RwLock::new(HashSet::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Takes the store offline or brings it back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes `modified_since` fail or succeed.
    pub fn set_feed_broken(&self, broken: bool) {
        self.feed_broken.store(broken, Ordering::SeqCst);
    }

    /// Makes every read and write of `id` fail.
    pub fn fail_id(&self, id: impl Into<String>) {
        self.failing_ids.write().insert(id.into());
    }

    /// Returns the number of writes that reached the inner store.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self, id: Option<&str>) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected outage".into()));
        }
        match id {
            Some(id) if self.failing_ids.read().contains(id) => {
                Err(StoreError::Corrupted(format!("injected failure on {id}")))
            }
            _ => Ok(()),
        }
    }

    fn wrote<T>(&self, result: StoreResult<T>) -> StoreResult<T> {
        if result.is_ok() {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        result
    }
}

impl EntityStore for FlakyStore {
    fn ping(&self) -> StoreResult<()> {
        self.check(None)?;
        self.inner.ping()
    }

    fn insert(&self, kind: EntityKind, fields: Fields) -> StoreResult<Record> {
        self.check(None)?;
        self.wrote(self.inner.insert(kind, fields))
    }

    fn get(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Record>> {
        self.check(Some(id))?;
        self.inner.get(kind, id)
    }

    fn put(&self, kind: EntityKind, id: &str, fields: Fields) -> StoreResult<Record> {
        self.check(Some(id))?;
        self.wrote(self.inner.put(kind, id, fields))
    }

    fn remove(&self, kind: EntityKind, id: &str) -> StoreResult<bool> {
        self.check(Some(id))?;
        self.wrote(self.inner.remove(kind, id))
    }

    fn modified_since(&self, kind: EntityKind, since: Timestamp) -> StoreResult<Vec<Record>> {
        self.check(None)?;
        if self.feed_broken.load(Ordering::SeqCst) {
            return Err(StoreError::Corrupted("injected feed failure".into()));
        }
        self.inner.modified_since(kind, since)
    }

    fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        self.check(None)?;
        self.inner.count(kind)
    }

    fn checkpoint(&self) -> StoreResult<Timestamp> {
        self.check(None)?;
        self.inner.checkpoint()
    }
}
