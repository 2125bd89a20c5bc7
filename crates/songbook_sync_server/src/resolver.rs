//! Conflict resolution.

use crate::handler::{HandlerError, HandlerResult, HandlerSet};
use songbook_sync_protocol::{OperationOutcome, OperationResult, Resolution, ResolutionChoice};
use tracing::{debug, warn};

/// Applies the client's decision for each previously reported conflict.
///
/// - `server` writes nothing.
/// - `client` overlays the supplied data with no timestamp check.
/// - `merge` applies the supplied data as a JSON merge patch.
///
/// A failed resolution is reported on its own and does not stop the rest.
pub struct ConflictResolver<'a> {
    handlers: &'a HandlerSet,
}

impl<'a> ConflictResolver<'a> {
    /// Creates a resolver over `handlers`.
    pub fn new(handlers: &'a HandlerSet) -> Self {
        Self { handlers }
    }

    /// Applies every resolution in submission order.
    pub fn resolve(&self, resolutions: Vec<Resolution>) -> Vec<OperationOutcome> {
        resolutions
            .into_iter()
            .map(|resolution| self.resolve_one(resolution))
            .collect()
    }

    fn resolve_one(&self, resolution: Resolution) -> OperationOutcome {
        debug!(
            operation_id = %resolution.operation_id,
            entity_kind = %resolution.entity_kind,
            entity_id = %resolution.entity_id,
            choice = resolution.choice.as_str(),
            "resolving"
        );

        let operation_id = resolution.operation_id.clone();
        let entity_kind = resolution.entity_kind;
        match self.apply(resolution) {
            Ok(result) => OperationOutcome::success(operation_id, entity_kind, result),
            Err(err) => {
                warn!(operation_id = %operation_id, error = %err, "resolution failed");
                OperationOutcome::failure(operation_id, err.code(), err.to_string())
            }
        }
    }

    fn apply(&self, resolution: Resolution) -> HandlerResult<OperationResult> {
        let handler = self.handlers.for_kind(resolution.entity_kind);
        let id = resolution.entity_id.as_str();
        let choice = resolution.choice;
        let data = resolution.data;
        let require_data = move || {
            data.ok_or_else(|| {
                HandlerError::InvalidOperation(format!("{choice} resolution requires data"))
            })
        };

        let record = match choice {
            ResolutionChoice::Server => {
                return Ok(OperationResult::Acknowledged {
                    message: format!("kept server version of {} {id}", resolution.entity_kind),
                });
            }
            ResolutionChoice::Client => handler.overwrite(id, require_data()?)?,
            ResolutionChoice::Merge => handler.merge(id, require_data()?)?,
        };
        Ok(OperationResult::Updated { record })
    }
}
