//! Protocol messages for sync.

use crate::change_feed::ChangeEntry;
use crate::operation::SyncOperation;
use crate::outcome::{ConflictRecord, OperationOutcome};
use crate::resolution::Resolution;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

/// BatchSync request: a client's queued offline edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSyncRequest {
    /// Queued operations, in client order.
    pub operations: Vec<SyncOperation>,
    /// The `server_timestamp` from the client's previous sync, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_last_sync: Option<Timestamp>,
}

impl BatchSyncRequest {
    /// Creates a batch request.
    pub fn new(operations: Vec<SyncOperation>) -> Self {
        Self {
            operations,
            client_last_sync: None,
        }
    }

    /// Requests the catch-up feed since `last_sync`.
    pub fn with_last_sync(mut self, last_sync: Timestamp) -> Self {
        self.client_last_sync = Some(last_sync);
        self
    }
}

/// BatchSync response.
///
/// Every submitted operation id appears exactly once across `results` and
/// `conflicts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSyncResponse {
    /// Successes and failures, in submission order.
    pub results: Vec<OperationOutcome>,
    /// Updates rejected because the server copy was newer.
    pub conflicts: Vec<ConflictRecord>,
    /// Server-side changes since `client_last_sync`.
    pub server_changes: Vec<ChangeEntry>,
    /// When the response was assembled; the client's next `client_last_sync`.
    pub server_timestamp: Timestamp,
}

impl BatchSyncResponse {
    /// Returns the number of operations accounted for.
    pub fn operation_count(&self) -> usize {
        self.results.len() + self.conflicts.len()
    }
}

/// ResolveConflicts request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConflictsRequest {
    /// One decision per conflict.
    pub resolutions: Vec<Resolution>,
}

impl ResolveConflictsRequest {
    /// Creates a resolve request.
    pub fn new(resolutions: Vec<Resolution>) -> Self {
        Self { resolutions }
    }
}

/// ResolveConflicts response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConflictsResponse {
    /// One outcome per resolution, in submission order.
    pub results: Vec<OperationOutcome>,
}

/// Status lookup request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    /// Operation ids to look up.
    pub operation_ids: Vec<String>,
}

/// Status reported for an operation id.
///
/// The server keeps no ledger of past operations, so the only value is
/// `Processed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// Fixed answer for any id.
    Processed,
}

/// Status of one operation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    /// The id that was asked about.
    pub operation_id: String,
    /// Its status.
    pub status: ProcessingStatus,
}

/// Status lookup response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// One status per requested id, in request order.
    pub statuses: Vec<OperationStatus>,
}

/// Call-level failure: validation, store unavailability or a codec error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
    /// Every structural problem found, for validation failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<String>,
}

impl ErrorResponse {
    /// Creates an error response.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            problems: Vec::new(),
        }
    }

    /// Attaches validation problems.
    pub fn with_problems(mut self, problems: Vec<String>) -> Self {
        self.problems = problems;
        self
    }
}
