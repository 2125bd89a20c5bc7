//! Test fixtures and server helpers.
//!
//! Provides a sync server wired to a manual clock, and builders for valid
//! payloads of each entity kind.

use serde_json::{json, Value};
use songbook_store::{EntityStore, FileStore, InMemoryStore, ManualClock};
use songbook_sync_protocol::{EntityKind, Fields, Record, Timestamp};
use songbook_sync_server::{ServerConfig, SyncServer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Clock reading every [`TestServer`] starts at: 2024-01-01T00:00:00Z.
pub const START_MILLIS: u64 = 1_704_067_200_000;

/// A sync server with a manual clock and automatic cleanup.
pub struct TestServer {
    /// The server instance.
    pub server: SyncServer,
    /// The store behind the server.
    pub store: Arc<dyn EntityStore>,
    /// The clock the store stamps with.
    pub clock: Arc<ManualClock>,
    memory: Option<Arc<InMemoryStore>>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestServer {
    /// Creates a server over an in-memory store.
    pub fn memory() -> Self {
        Self::memory_with_config(ServerConfig::default())
    }

    /// Creates a server over an in-memory store with `config`.
    pub fn memory_with_config(config: ServerConfig) -> Self {
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(START_MILLIS)));
        let memory = Arc::new(InMemoryStore::with_clock(clock.clone()));
        let store: Arc<dyn EntityStore> = memory.clone();
        Self {
            server: SyncServer::new(config, Arc::clone(&store)),
            store,
            clock,
            memory: Some(memory),
            _temp_dir: None,
        }
    }

    /// Creates a server over a file store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(START_MILLIS)));
        let file = FileStore::open_with_clock(temp_dir.path().join("store.json"), clock.clone())
            .expect("Failed to open file store");
        let store: Arc<dyn EntityStore> = Arc::new(file);
        Self {
            server: SyncServer::new(ServerConfig::default(), Arc::clone(&store)),
            store,
            clock,
            memory: None,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Creates a server over an arbitrary store, e.g. a [`crate::FlakyStore`].
    pub fn over(store: Arc<dyn EntityStore>, clock: Arc<ManualClock>) -> Self {
        Self {
            server: SyncServer::new(ServerConfig::default(), Arc::clone(&store)),
            store,
            clock,
            memory: None,
            _temp_dir: None,
        }
    }

    /// Returns the snapshot path if file-based, None otherwise.
    pub fn path(&self) -> Option<PathBuf> {
        self._temp_dir.as_ref().map(|d| d.path().join("store.json"))
    }

    /// Stores a record under `id`, stamped at the current clock reading.
    pub fn seed(&self, kind: EntityKind, id: &str, fields: Fields) -> Record {
        self.store.put(kind, id, fields).expect("Failed to seed record")
    }

    /// Stores a record with an exact id and stamp (in-memory servers only).
    pub fn seed_at(&self, kind: EntityKind, id: &str, at: Timestamp, fields: Fields) -> Record {
        let memory = self
            .memory
            .as_ref()
            .expect("seed_at requires an in-memory server");
        let record = Record::new(id, at, fields);
        memory.restore(kind, record.clone());
        record
    }

    /// Reads a record back from the store.
    pub fn get(&self, kind: EntityKind, id: &str) -> Option<Record> {
        self.store.get(kind, id).expect("Failed to read record")
    }

    /// Returns the number of stored records of `kind`.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.store.count(kind).expect("Failed to count records")
    }

    /// Returns the number of stored records across every kind.
    pub fn total(&self) -> usize {
        EntityKind::ALL.into_iter().map(|k| self.count(k)).sum()
    }

    /// Returns the current clock reading.
    pub fn now(&self) -> Timestamp {
        songbook_store::Clock::now(self.clock.as_ref())
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}

impl std::ops::Deref for TestServer {
    type Target = SyncServer;

    fn deref(&self) -> &Self::Target {
        &self.server
    }
}

/// Converts a JSON object literal into [`Fields`].
///
/// # Panics
///
/// Panics if `value` is not an object.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// A valid song payload.
pub fn song(title: &str) -> Fields {
    fields(json!({ "title": title }))
}

/// A valid setlist payload.
pub fn setlist(name: &str, song_ids: &[&str]) -> Fields {
    fields(json!({ "name": name, "songIds": song_ids }))
}

/// A valid arrangement payload.
pub fn arrangement(song_id: &str, name: &str) -> Fields {
    fields(json!({ "songId": song_id, "name": name }))
}

/// A valid user payload.
pub fn user(email: &str) -> Fields {
    fields(json!({ "email": email }))
}

/// A valid payload for any kind.
pub fn payload_for(kind: EntityKind, label: &str) -> Fields {
    match kind {
        EntityKind::Song => song(label),
        EntityKind::Setlist => setlist(label, &[]),
        EntityKind::Arrangement => arrangement("song-1", label),
        EntityKind::User => user(&format!("{label}@example.com")),
    }
}
