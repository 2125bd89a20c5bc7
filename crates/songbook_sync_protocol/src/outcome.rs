//! Per-operation results and conflicts.

use crate::record::Record;
use crate::types::{EntityKind, Fields, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code attached to a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    /// The target record does not exist.
    NotFound,
    /// The payload violates the entity kind's field rules.
    InvalidPayload,
    /// The operation is missing a field its kind requires.
    InvalidOperation,
    /// The store rejected the read or write.
    StoreError,
}

impl FailureCode {
    /// Returns the wire name of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::NotFound => "NOT_FOUND",
            FailureCode::InvalidPayload => "INVALID_PAYLOAD",
            FailureCode::InvalidOperation => "INVALID_OPERATION",
            FailureCode::StoreError => "STORE_ERROR",
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful operation did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum OperationResult {
    /// A record was created.
    Created {
        /// The stored record.
        record: Record,
    },
    /// A record was updated (or, for users, upserted).
    Updated {
        /// The stored record after the write.
        record: Record,
    },
    /// A record was deleted.
    Deleted {
        /// The id that was deleted.
        entity_id: String,
        /// Whether the record existed before the delete.
        existed: bool,
    },
    /// No write was performed.
    Acknowledged {
        /// Informational message.
        message: String,
    },
}

impl OperationResult {
    /// Returns the stored record, if the operation produced one.
    pub fn record(&self) -> Option<&Record> {
        match self {
            OperationResult::Created { record } | OperationResult::Updated { record } => {
                Some(record)
            }
            OperationResult::Deleted { .. } | OperationResult::Acknowledged { .. } => None,
        }
    }
}

/// Result of dispatching one operation or resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum OperationOutcome {
    /// The operation was applied.
    Success {
        /// Correlation id of the operation.
        operation_id: String,
        /// Kind of the affected entity.
        entity_kind: EntityKind,
        /// What was done.
        result: OperationResult,
    },
    /// The operation failed; sibling operations were unaffected.
    Failure {
        /// Correlation id of the operation.
        operation_id: String,
        /// Error code.
        code: FailureCode,
        /// Human-readable description.
        message: String,
    },
}

impl OperationOutcome {
    /// Creates a success outcome.
    pub fn success(
        operation_id: impl Into<String>,
        entity_kind: EntityKind,
        result: OperationResult,
    ) -> Self {
        OperationOutcome::Success {
            operation_id: operation_id.into(),
            entity_kind,
            result,
        }
    }

    /// Creates a failure outcome.
    pub fn failure(
        operation_id: impl Into<String>,
        code: FailureCode,
        message: impl Into<String>,
    ) -> Self {
        OperationOutcome::Failure {
            operation_id: operation_id.into(),
            code,
            message: message.into(),
        }
    }

    /// Returns the correlation id.
    pub fn operation_id(&self) -> &str {
        match self {
            OperationOutcome::Success { operation_id, .. }
            | OperationOutcome::Failure { operation_id, .. } => operation_id,
        }
    }

    /// Returns true for a success outcome.
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success { .. })
    }

    /// Returns the failure code, if this is a failure.
    pub fn failure_code(&self) -> Option<FailureCode> {
        match self {
            OperationOutcome::Failure { code, .. } => Some(*code),
            OperationOutcome::Success { .. } => None,
        }
    }

    /// Returns the success result, if this is a success.
    pub fn result(&self) -> Option<&OperationResult> {
        match self {
            OperationOutcome::Success { result, .. } => Some(result),
            OperationOutcome::Failure { .. } => None,
        }
    }
}

/// A write-write collision between a client's stale view and newer
/// server state.
///
/// Conflicts are reported apart from failures so clients can route them to
/// reconciliation UI. The server keeps no copy after the response is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    /// Correlation id of the conflicting operation.
    pub operation_id: String,
    /// Kind of the contested entity.
    pub entity_kind: EntityKind,
    /// Id of the contested entity.
    pub entity_id: String,
    /// The record as currently stored.
    pub server_data: Record,
    /// The payload the client submitted.
    pub client_data: Fields,
    /// The stored record's last-modified time.
    pub server_last_modified: Timestamp,
}
