//! Operation status lookup.

use songbook_sync_protocol::{OperationStatus, ProcessingStatus, StatusResponse};

/// Echoes `processed` for every id.
///
/// No ledger of past operations is kept, so this cannot tell succeeded,
/// failed and unknown ids apart.
pub(crate) fn lookup(operation_ids: Vec<String>) -> StatusResponse {
    StatusResponse {
        statuses: operation_ids
            .into_iter()
            .map(|operation_id| OperationStatus {
                operation_id,
                status: ProcessingStatus::Processed,
            })
            .collect(),
    }
}
