//! In-memory entity store.

use crate::clock::{Clock, SystemClock};
use crate::error::StoreResult;
use crate::store::EntityStore;
use parking_lot::RwLock;
use songbook_sync_protocol::{EntityKind, Fields, Record, Timestamp};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

/// An in-memory entity store.
///
/// This store keeps all records in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral servers that don't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads. Each call
/// takes the lock once; nothing is held between calls.
///
/// # Example
///
/// ```rust
/// use songbook_store::{EntityStore, InMemoryStore};
/// use songbook_sync_protocol::{EntityKind, Fields, Timestamp};
///
/// let store = InMemoryStore::new();
/// let record = store.insert(EntityKind::Setlist, Fields::new()).unwrap();
/// let changed = store.modified_since(EntityKind::Setlist, Timestamp::EPOCH).unwrap();
/// assert_eq!(changed, vec![record]);
/// ```
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<EntityKind, BTreeMap<String, Record>>,
    last_stamp: Timestamp,
}

impl Inner {
    /// Issues a stamp strictly after every previous one.
    fn stamp(&mut self, now: Timestamp) -> Timestamp {
        let stamp = now.max(self.last_stamp.next());
        self.last_stamp = stamp;
        stamp
    }

    /// Issues a watermark no later stamp can reach.
    fn checkpoint(&mut self, now: Timestamp) -> Timestamp {
        self.last_stamp = now.max(self.last_stamp);
        self.last_stamp
    }

    fn collection(&mut self, kind: EntityKind) -> &mut BTreeMap<String, Record> {
        self.collections.entry(kind).or_default()
    }
}

impl InMemoryStore {
    /// Creates an empty store stamping from the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store stamping from `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }

    /// Inserts a record exactly as given, keeping its id and stamp.
    ///
    /// Used to load snapshots and to seed test fixtures with known
    /// timestamps. Later stamps stay ahead of the restored one.
    pub fn restore(&self, kind: EntityKind, record: Record) {
        let mut inner = self.inner.write();
        if record.last_modified > inner.last_stamp {
            inner.last_stamp = record.last_modified;
        }
        inner.collection(kind).insert(record.id.clone(), record);
    }

    /// Returns every record, grouped by kind.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<EntityKind, Vec<Record>> {
        let inner = self.inner.read();
        EntityKind::ALL
            .into_iter()
            .map(|kind| {
                let records = inner
                    .collections
                    .get(&kind)
                    .map(|c| c.values().cloned().collect())
                    .unwrap_or_default();
                (kind, records)
            })
            .collect()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore for InMemoryStore {
    fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn insert(&self, kind: EntityKind, fields: Fields) -> StoreResult<Record> {
        let now = self.clock.now();
        let mut inner = self.inner.write();
        let id = Uuid::new_v4().to_string();
        let record = Record::new(id.clone(), inner.stamp(now), fields);
        inner.collection(kind).insert(id, record.clone());
        Ok(record)
    }

    fn get(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Record>> {
        let inner = self.inner.read();
        Ok(inner
            .collections
            .get(&kind)
            .and_then(|c| c.get(id))
            .cloned())
    }

    fn put(&self, kind: EntityKind, id: &str, fields: Fields) -> StoreResult<Record> {
        let now = self.clock.now();
        let mut inner = self.inner.write();
        let record = Record::new(id, inner.stamp(now), fields);
        inner.collection(kind).insert(id.to_string(), record.clone());
        Ok(record)
    }

    fn remove(&self, kind: EntityKind, id: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write();
        Ok(inner.collection(kind).remove(id).is_some())
    }

    fn modified_since(&self, kind: EntityKind, since: Timestamp) -> StoreResult<Vec<Record>> {
        let inner = self.inner.read();
        let mut records: Vec<Record> = inner
            .collections
            .get(&kind)
            .map(|c| {
                c.values()
                    .filter(|r| r.last_modified > since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }

    fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        Ok(self
            .inner
            .read()
            .collections
            .get(&kind)
            .map(BTreeMap::len)
            .unwrap_or(0))
    }

    fn checkpoint(&self) -> StoreResult<Timestamp> {
        let now = self.clock.now();
        Ok(self.inner.write().checkpoint(now))
    }
}
