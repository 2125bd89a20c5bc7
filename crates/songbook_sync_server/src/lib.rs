//! # Songbook Sync Server
//!
//! Batched offline-sync and conflict-reconciliation engine.
//!
//! This crate provides:
//! - Structural validation of inbound batches
//! - One sync handler per entity kind (song, setlist, arrangement, user)
//! - Timestamp-based write-write conflict detection
//! - A batch dispatcher with per-operation partial-failure semantics
//! - The catch-up feed of server changes since the client's last sync
//! - The conflict-resolution handshake
//!
//! # Protocol
//!
//! 1. Client sends its queued edits plus its last sync time (BatchSync)
//! 2. Server applies each edit in order; stale updates come back as conflicts
//! 3. Server returns results, conflicts, the catch-up feed and a new sync time
//! 4. Client later submits a choice per conflict (ResolveConflicts)
//!
//! # Concurrency
//!
//! Optimistic. Operations within a batch run sequentially against a shared
//! [`EntityStore`](songbook_store::EntityStore); no lock is held across store
//! calls and there is no batch-level transaction. Correctness under
//! concurrent writers rests on the per-update timestamp comparison.
//!
//! # Example
//!
//! ```rust
//! use songbook_store::InMemoryStore;
//! use songbook_sync_protocol::{BatchSyncRequest, EntityKind, Fields, SyncOperation};
//! use songbook_sync_server::{ServerConfig, SyncServer};
//! use std::sync::Arc;
//!
//! let server = SyncServer::new(ServerConfig::default(), Arc::new(InMemoryStore::new()));
//!
//! let mut song = Fields::new();
//! song.insert("title".into(), "It Is Well".into());
//! let request = BatchSyncRequest::new(vec![SyncOperation::create("op-1", EntityKind::Song, song)]);
//!
//! let response = server.sync(&request).unwrap();
//! assert_eq!(response.results.len(), 1);
//! assert!(response.conflicts.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod change_feed;
mod config;
mod dispatcher;
mod error;
mod handler;
mod resolver;
mod server;
mod status;
mod validator;

pub use change_feed::ChangeFeedBuilder;
pub use config::{ServerConfig, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_RESOLUTIONS};
pub use dispatcher::{BatchDispatcher, DispatchReport, Dispatched};
pub use error::{ServerError, ServerResult, ValidationError};
pub use handler::{
    ArrangementHandler, ArrangementRules, CollectionHandler, EntityRules, EntitySyncHandler,
    HandlerError, HandlerResult, HandlerSet, PayloadMode, SetlistHandler, SetlistRules,
    SongHandler, SongRules, UpdateOutcome, UserHandler, UserRules,
};
pub use resolver::ConflictResolver;
pub use server::{Endpoint, SyncServer};
pub use validator::{validate_batch, validate_resolutions, validate_status, ValidatedBatch};
