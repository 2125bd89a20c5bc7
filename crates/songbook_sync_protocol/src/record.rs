//! Stored entity records.

use crate::types::{Fields, Timestamp};
use serde::{Deserialize, Serialize};

/// Keys owned by the server. Client payloads cannot set them.
pub const RESERVED_FIELDS: [&str; 2] = ["id", "lastModified"];

/// Removes server-owned keys from a client payload.
pub fn strip_reserved(fields: &mut Fields) {
    for key in RESERVED_FIELDS {
        fields.remove(key);
    }
}

/// A record as held by the entity store.
///
/// On the wire a record is a flat object: `{ "id", "lastModified", ...fields }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Store-assigned identifier.
    pub id: String,
    /// Time of the last write to this record.
    pub last_modified: Timestamp,
    /// Entity-kind-specific fields.
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Creates a record.
    pub fn new(id: impl Into<String>, last_modified: Timestamp, fields: Fields) -> Self {
        Self {
            id: id.into(),
            last_modified,
            fields,
        }
    }

    /// Returns a field value.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    /// Returns a string field value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}
