//! Queued client operations.

use crate::types::{EntityKind, Fields, OperationKind, Timestamp};
use serde::{Deserialize, Serialize};

/// One queued offline edit.
///
/// # Fields
///
/// - `id`: client-generated correlation id, unique within a batch
/// - `kind`: create, update or delete
/// - `entity_kind`: which collection the edit targets
/// - `entity_id`: target record (absent for create)
/// - `payload`: entity fields, interpreted only by the matching handler
/// - `client_timestamp`: the client's view of the record's last write
///   (required for update)
/// - `client_id`: originating client, for diagnostics only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOperation {
    /// Correlation id.
    pub id: String,
    /// Operation kind.
    pub kind: OperationKind,
    /// Target entity kind.
    pub entity_kind: EntityKind,
    /// Target record id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Entity fields.
    #[serde(default)]
    pub payload: Fields,
    /// Client's last-modified view of the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<Timestamp>,
    /// Originating client tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl SyncOperation {
    /// Creates a create operation.
    pub fn create(id: impl Into<String>, entity_kind: EntityKind, payload: Fields) -> Self {
        Self {
            id: id.into(),
            kind: OperationKind::Create,
            entity_kind,
            entity_id: None,
            payload,
            client_timestamp: None,
            client_id: None,
        }
    }

    /// Creates an update operation.
    pub fn update(
        id: impl Into<String>,
        entity_kind: EntityKind,
        entity_id: impl Into<String>,
        payload: Fields,
        client_timestamp: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            kind: OperationKind::Update,
            entity_kind,
            entity_id: Some(entity_id.into()),
            payload,
            client_timestamp: Some(client_timestamp),
            client_id: None,
        }
    }

    /// Creates a delete operation.
    pub fn delete(
        id: impl Into<String>,
        entity_kind: EntityKind,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: OperationKind::Delete,
            entity_kind,
            entity_id: Some(entity_id.into()),
            payload: Fields::new(),
            client_timestamp: None,
            client_id: None,
        }
    }

    /// Tags the operation with its originating client.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}
