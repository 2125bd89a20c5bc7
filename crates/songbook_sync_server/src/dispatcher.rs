//! Batch dispatch.

use crate::handler::{HandlerError, HandlerResult, HandlerSet, UpdateOutcome};
use songbook_sync_protocol::{
    ConflictRecord, FailureCode, OperationKind, OperationOutcome, OperationResult, SyncOperation,
};
use tracing::{debug, warn};

/// Outcome of applying one operation: exactly one of three.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// The operation was applied.
    Success(OperationResult),
    /// The operation failed.
    Failure {
        /// Error code.
        code: FailureCode,
        /// Description.
        message: String,
    },
    /// The update was stale; nothing was written.
    Conflict(ConflictRecord),
}

impl From<HandlerError> for Dispatched {
    fn from(err: HandlerError) -> Self {
        Dispatched::Failure {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Results of one dispatched batch.
///
/// Every operation id lands in exactly one of the two lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Successes and failures, in submission order.
    pub results: Vec<OperationOutcome>,
    /// Stale updates, in submission order.
    pub conflicts: Vec<ConflictRecord>,
}

impl DispatchReport {
    /// Returns the number of operations accounted for.
    pub fn len(&self) -> usize {
        self.results.len() + self.conflicts.len()
    }

    /// Returns true if no operation was dispatched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Routes operations to their entity handler, one at a time.
///
/// A failed operation never stops its siblings, and there is no batch
/// transaction: earlier writes stay committed.
pub struct BatchDispatcher<'a> {
    handlers: &'a HandlerSet,
}

impl<'a> BatchDispatcher<'a> {
    /// Creates a dispatcher over `handlers`.
    pub fn new(handlers: &'a HandlerSet) -> Self {
        Self { handlers }
    }

    /// Applies every operation in submission order.
    pub fn dispatch(&self, operations: Vec<SyncOperation>) -> DispatchReport {
        let mut report = DispatchReport::default();

        for op in operations {
            match self.apply(&op) {
                Dispatched::Success(result) => {
                    report
                        .results
                        .push(OperationOutcome::success(op.id, op.entity_kind, result));
                }
                Dispatched::Failure { code, message } => {
                    warn!(operation_id = %op.id, %code, %message, "operation failed");
                    report
                        .results
                        .push(OperationOutcome::failure(op.id, code, message));
                }
                Dispatched::Conflict(conflict) => {
                    warn!(
                        operation_id = %op.id,
                        entity_kind = %conflict.entity_kind,
                        entity_id = %conflict.entity_id,
                        "conflict"
                    );
                    report.conflicts.push(conflict);
                }
            }
        }

        report
    }

    /// Applies a single operation.
    pub fn apply(&self, op: &SyncOperation) -> Dispatched {
        debug!(
            operation_id = %op.id,
            kind = op.kind.as_str(),
            entity_kind = %op.entity_kind,
            client_id = op.client_id.as_deref().unwrap_or("-"),
            "dispatching"
        );

        match self.try_apply(op) {
            Ok(dispatched) => dispatched,
            Err(err) => err.into(),
        }
    }

    fn try_apply(&self, op: &SyncOperation) -> HandlerResult<Dispatched> {
        let handler = self.handlers.for_kind(op.entity_kind);

        match op.kind {
            OperationKind::Create => {
                let record = handler.create(op.payload.clone())?;
                Ok(Dispatched::Success(OperationResult::Created { record }))
            }
            OperationKind::Update => {
                let entity_id = entity_id(op)?;
                let client_timestamp = op.client_timestamp.ok_or_else(|| {
                    HandlerError::InvalidOperation("update requires clientTimestamp".into())
                })?;

                match handler.update(entity_id, op.payload.clone(), client_timestamp)? {
                    UpdateOutcome::Applied(record) => {
                        Ok(Dispatched::Success(OperationResult::Updated { record }))
                    }
                    UpdateOutcome::Conflict { server } => Ok(Dispatched::Conflict(ConflictRecord {
                        operation_id: op.id.clone(),
                        entity_kind: op.entity_kind,
                        entity_id: entity_id.to_string(),
                        server_last_modified: server.last_modified,
                        server_data: server,
                        client_data: op.payload.clone(),
                    })),
                }
            }
            OperationKind::Delete => {
                let entity_id = entity_id(op)?;
                let existed = handler.delete(entity_id)?;
                Ok(Dispatched::Success(OperationResult::Deleted {
                    entity_id: entity_id.to_string(),
                    existed,
                }))
            }
        }
    }
}

fn entity_id(op: &SyncOperation) -> HandlerResult<&str> {
    op.entity_id.as_deref().ok_or_else(|| {
        HandlerError::InvalidOperation(format!("{} requires entityId", op.kind.as_str()))
    })
}
