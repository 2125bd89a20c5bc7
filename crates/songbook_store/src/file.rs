//! File-backed entity store.

use crate::clock::{Clock, SystemClock};
use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryStore;
use crate::store::EntityStore;
use parking_lot::Mutex;
use songbook_sync_protocol::{EntityKind, Fields, Record, Timestamp};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A store persisted as one JSON snapshot file.
///
/// Records live in an [`InMemoryStore`]; after every write the whole
/// snapshot is written to a temporary sibling file and renamed over the
/// original, so a crash leaves either the old or the new snapshot.
///
/// The snapshot format is `{ "song": [record...], "setlist": [...], ... }`.
pub struct FileStore {
    path: PathBuf,
    records: InMemoryStore,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens a snapshot, stamping from the system clock.
    ///
    /// A missing file opens as an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Opens a snapshot, stamping from `clock`.
    pub fn open_with_clock(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let records = InMemoryStore::with_clock(clock);

        match fs::read(&path) {
            Ok(bytes) => {
                let snapshot: BTreeMap<EntityKind, Vec<Record>> = serde_json::from_slice(&bytes)?;
                for (kind, list) in snapshot {
                    for record in list {
                        if record.id.is_empty() {
                            return Err(StoreError::Corrupted(format!(
                                "{kind} record with empty id in {}",
                                path.display()
                            )));
                        }
                        records.restore(kind, record);
                    }
                }
                debug!(path = %path.display(), "loaded store snapshot");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot, starting empty");
            }
            Err(e) => return Err(StoreError::Io(e)),
        }

        Ok(Self {
            path,
            records,
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the snapshot path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(&self.records.snapshot())?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Persists the snapshot, putting `previous` back in memory if that
    /// fails so memory never runs ahead of the file.
    fn persist_or_restore(
        &self,
        kind: EntityKind,
        id: &str,
        previous: Option<Record>,
    ) -> StoreResult<()> {
        let Err(e) = self.persist() else {
            return Ok(());
        };
        warn!(
            path = %self.path.display(),
            entity_kind = %kind,
            entity_id = id,
            error = %e,
            "persist failed, rolling back"
        );
        match previous {
            Some(record) => self.records.restore(kind, record),
            None => {
                self.records.remove(kind, id)?;
            }
        }
        Err(e)
    }
}

impl EntityStore for FileStore {
    fn ping(&self) -> StoreResult<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => Err(
                StoreError::Unavailable(format!("directory {} is missing", parent.display())),
            ),
            _ => Ok(()),
        }
    }

    fn insert(&self, kind: EntityKind, fields: Fields) -> StoreResult<Record> {
        let _guard = self.write_lock.lock();
        let record = self.records.insert(kind, fields)?;
        self.persist_or_restore(kind, &record.id, None)?;
        Ok(record)
    }

    fn get(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Record>> {
        self.records.get(kind, id)
    }

    fn put(&self, kind: EntityKind, id: &str, fields: Fields) -> StoreResult<Record> {
        let _guard = self.write_lock.lock();
        let previous = self.records.get(kind, id)?;
        let record = self.records.put(kind, id, fields)?;
        self.persist_or_restore(kind, id, previous)?;
        Ok(record)
    }

    fn remove(&self, kind: EntityKind, id: &str) -> StoreResult<bool> {
        let _guard = self.write_lock.lock();
        let Some(previous) = self.records.get(kind, id)? else {
            return Ok(false);
        };
        self.records.remove(kind, id)?;
        self.persist_or_restore(kind, id, Some(previous))?;
        Ok(true)
    }

    fn modified_since(&self, kind: EntityKind, since: Timestamp) -> StoreResult<Vec<Record>> {
        self.records.modified_since(kind, since)
    }

    fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        self.records.count(kind)
    }

    fn checkpoint(&self) -> StoreResult<Timestamp> {
        self.records.checkpoint()
    }
}
