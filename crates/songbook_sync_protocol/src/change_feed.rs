//! Catch-up feed entries.

use crate::record::Record;
use crate::types::EntityKind;
use serde::{Deserialize, Serialize};

/// One record modified after the client's reference timestamp.
///
/// Entries are produced only by the catch-up feed, never by batch dispatch.
/// Deleted records do not appear: a delete removes the record from the store
/// and leaves nothing to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    /// Kind of the changed record.
    pub entity_kind: EntityKind,
    /// The record as currently stored.
    pub data: Record,
}

impl ChangeEntry {
    /// Creates a change entry.
    pub fn new(entity_kind: EntityKind, data: Record) -> Self {
        Self { entity_kind, data }
    }
}
