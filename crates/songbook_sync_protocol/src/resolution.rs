//! Client decisions for reported conflicts.

use crate::types::{EntityKind, Fields};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a conflict the client chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionChoice {
    /// Keep the client version: overlay `data` onto the stored record.
    Client,
    /// Keep the server version: no write.
    Server,
    /// Apply `data` as a JSON merge patch onto the stored record.
    Merge,
}

impl ResolutionChoice {
    /// Returns the wire name of this choice.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionChoice::Client => "client",
            ResolutionChoice::Server => "server",
            ResolutionChoice::Merge => "merge",
        }
    }

    /// Parses a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "client" => Some(ResolutionChoice::Client),
            "server" => Some(ResolutionChoice::Server),
            "merge" => Some(ResolutionChoice::Merge),
            _ => None,
        }
    }

    /// Returns true if this choice writes and so needs `data`.
    pub fn requires_data(&self) -> bool {
        !matches!(self, ResolutionChoice::Server)
    }
}

impl fmt::Display for ResolutionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The client's decision for one previously reported conflict.
///
/// The server keeps no ledger of outstanding conflicts, so a resolution
/// names the contested entity itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Correlation id of the conflicting operation.
    pub operation_id: String,
    /// Kind of the contested entity.
    pub entity_kind: EntityKind,
    /// Id of the contested entity.
    pub entity_id: String,
    /// The client's choice.
    pub choice: ResolutionChoice,
    /// Data to write (required for `client` and `merge`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Fields>,
}

impl Resolution {
    /// Keeps the server version.
    pub fn keep_server(
        operation_id: impl Into<String>,
        entity_kind: EntityKind,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            entity_kind,
            entity_id: entity_id.into(),
            choice: ResolutionChoice::Server,
            data: None,
        }
    }

    /// Keeps the client version.
    pub fn keep_client(
        operation_id: impl Into<String>,
        entity_kind: EntityKind,
        entity_id: impl Into<String>,
        data: Fields,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            entity_kind,
            entity_id: entity_id.into(),
            choice: ResolutionChoice::Client,
            data: Some(data),
        }
    }

    /// Applies a merge patch.
    pub fn merge(
        operation_id: impl Into<String>,
        entity_kind: EntityKind,
        entity_id: impl Into<String>,
        patch: Fields,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            entity_kind,
            entity_id: entity_id.into(),
            choice: ResolutionChoice::Merge,
            data: Some(patch),
        }
    }
}
