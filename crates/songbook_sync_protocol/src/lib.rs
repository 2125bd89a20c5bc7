//! # Songbook Sync Protocol
//!
//! Types exchanged between offline-capable songbook clients and the sync
//! server.
//!
//! This crate provides:
//! - `SyncOperation` for queued client edits
//! - `Record`, the stored shape of any entity
//! - `OperationOutcome` and `ConflictRecord` for per-operation results
//! - `ChangeEntry` for the catch-up feed
//! - `Resolution` for the conflict-resolution handshake
//! - Request/response messages for BatchSync, ResolveConflicts and Status
//! - JSON and CBOR encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change_feed;
mod codec;
mod messages;
mod operation;
mod outcome;
mod record;
mod resolution;
mod types;

pub use change_feed::ChangeEntry;
pub use codec::{decode, decode_document, encode, CodecError, CodecResult, WireFormat};
pub use messages::{
    BatchSyncRequest, BatchSyncResponse, ErrorResponse, OperationStatus, ProcessingStatus,
    ResolveConflictsRequest, ResolveConflictsResponse, StatusRequest, StatusResponse,
};
pub use operation::SyncOperation;
pub use outcome::{ConflictRecord, FailureCode, OperationOutcome, OperationResult};
pub use record::{strip_reserved, Record, RESERVED_FIELDS};
pub use resolution::{Resolution, ResolutionChoice};
pub use types::{EntityKind, Fields, OperationKind, Timestamp};
