//! # Songbook Store
//!
//! The entity store the sync engine writes through.
//!
//! The sync core treats the store as an injected collaborator. It needs only
//! per-kind create, read, write and delete, plus "records modified after a
//! timestamp". Ownership and lifecycle of the store stay with the caller.
//!
//! ## Design Principles
//!
//! - One collection per [`EntityKind`](songbook_sync_protocol::EntityKind)
//! - Every write stamps the record's `last_modified` from an injected [`Clock`]
//! - Stamps issued by one store are strictly increasing
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral servers
//! - [`FileStore`] - JSON snapshot on disk, rewritten after every write
//!
//! ## Example
//!
//! ```rust
//! use songbook_store::{EntityStore, InMemoryStore};
//! use songbook_sync_protocol::{EntityKind, Fields};
//!
//! let store = InMemoryStore::new();
//! let mut fields = Fields::new();
//! fields.insert("title".into(), "Be Thou My Vision".into());
//!
//! let record = store.insert(EntityKind::Song, fields).unwrap();
//! let loaded = store.get(EntityKind::Song, &record.id).unwrap();
//! assert_eq!(loaded, Some(record));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod error;
mod file;
mod memory;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use store::EntityStore;
