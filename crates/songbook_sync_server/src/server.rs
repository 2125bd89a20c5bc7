//! Main sync server.

use crate::change_feed::ChangeFeedBuilder;
use crate::config::ServerConfig;
use crate::dispatcher::BatchDispatcher;
use crate::error::{ServerError, ServerResult};
use crate::handler::HandlerSet;
use crate::resolver::ConflictResolver;
use crate::status;
use crate::validator::{validate_batch, validate_resolutions, validate_status, ValidatedBatch};
use serde_json::Value;
use songbook_store::EntityStore;
use songbook_sync_protocol::{
    decode_document, encode, BatchSyncRequest, BatchSyncResponse, ChangeEntry, CodecError,
    ResolveConflictsRequest, ResolveConflictsResponse, StatusRequest, StatusResponse, Timestamp,
    WireFormat,
};
use std::sync::Arc;
use tracing::{error, info};

/// A logical call the server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Apply a batch of queued edits.
    BatchSync,
    /// Apply conflict resolutions.
    ResolveConflicts,
    /// Look up operation status.
    Status,
}

/// The sync server.
///
/// Validates requests, pings the store, then hands operations to the
/// dispatcher or resolver. The store is injected and outlives the server.
///
/// # Example
///
/// ```
/// use songbook_store::InMemoryStore;
/// use songbook_sync_server::{ServerConfig, SyncServer};
/// use std::sync::Arc;
///
/// let server = SyncServer::new(ServerConfig::default(), Arc::new(InMemoryStore::new()));
///
/// // In a real application, you would expose HTTP endpoints
/// // that call server.batch_sync(), resolve_conflicts(), status()
/// let response = server
///     .batch_sync(&serde_json::json!({ "operations": [] }))
///     .unwrap();
/// assert!(response.results.is_empty());
/// ```
pub struct SyncServer {
    config: ServerConfig,
    store: Arc<dyn EntityStore>,
    handlers: HandlerSet,
}

impl SyncServer {
    /// Creates a server over `store`.
    pub fn new(config: ServerConfig, store: Arc<dyn EntityStore>) -> Self {
        let handlers = HandlerSet::new(Arc::clone(&store));
        Self {
            config,
            store,
            handlers,
        }
    }

    /// Handles a BatchSync request document.
    ///
    /// # Errors
    ///
    /// Fails the whole call on a structural problem or an unreachable store,
    /// before any operation is attempted, or if the catch-up feed cannot be
    /// read. Per-operation failures and conflicts are part of the response.
    pub fn batch_sync(&self, request: &Value) -> ServerResult<BatchSyncResponse> {
        let batch = validate_batch(request, self.config.max_batch_size)?;
        self.run_batch(batch)
    }

    /// Handles a typed BatchSync request.
    ///
    /// Typed requests go through the same validation as documents.
    pub fn sync(&self, request: &BatchSyncRequest) -> ServerResult<BatchSyncResponse> {
        self.batch_sync(&to_document(request)?)
    }

    fn run_batch(&self, batch: ValidatedBatch) -> ServerResult<BatchSyncResponse> {
        self.ensure_store()?;

        let submitted = batch.operations.len();
        let report = BatchDispatcher::new(&self.handlers).dispatch(batch.operations);

        // Writes landing after this point are stamped later and left to the
        // client's next sync.
        let server_timestamp = self.store.checkpoint()?;
        let server_changes = if self.config.include_catch_up {
            ChangeFeedBuilder::new(self.store.as_ref())
                .up_to(server_timestamp)
                .changes_since(batch.client_last_sync)?
        } else {
            Vec::new()
        };

        let failed = report.results.iter().filter(|r| !r.is_success()).count();
        info!(
            operations = submitted,
            succeeded = report.results.len() - failed,
            failed,
            conflicts = report.conflicts.len(),
            changes = server_changes.len(),
            %server_timestamp,
            "batch sync complete"
        );

        Ok(BatchSyncResponse {
            results: report.results,
            conflicts: report.conflicts,
            server_changes,
            server_timestamp,
        })
    }

    /// Handles a ResolveConflicts request document.
    ///
    /// # Errors
    ///
    /// Fails the whole call on a structural problem or an unreachable store.
    pub fn resolve_conflicts(&self, request: &Value) -> ServerResult<ResolveConflictsResponse> {
        let resolutions = validate_resolutions(request, self.config.max_resolutions)?;
        self.ensure_store()?;

        let submitted = resolutions.len();
        let results = ConflictResolver::new(&self.handlers).resolve(resolutions);

        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(
            resolutions = submitted,
            failed, "resolve conflicts complete"
        );
        Ok(ResolveConflictsResponse { results })
    }

    /// Handles a typed ResolveConflicts request.
    pub fn resolve(&self, request: &ResolveConflictsRequest) -> ServerResult<ResolveConflictsResponse> {
        self.resolve_conflicts(&to_document(request)?)
    }

    /// Handles a status lookup document.
    pub fn status(&self, request: &Value) -> ServerResult<StatusResponse> {
        let ids = validate_status(request)?;
        Ok(status::lookup(ids))
    }

    /// Handles a typed status lookup.
    pub fn lookup(&self, request: &StatusRequest) -> ServerResult<StatusResponse> {
        self.status(&to_document(request)?)
    }

    /// Returns the catch-up feed since `since`.
    pub fn changes_since(&self, since: Option<Timestamp>) -> ServerResult<Vec<ChangeEntry>> {
        Ok(ChangeFeedBuilder::new(self.store.as_ref()).changes_since(since)?)
    }

    /// Decodes `body`, handles it as `endpoint`, and encodes the response in
    /// the same format.
    pub fn handle_bytes(
        &self,
        endpoint: Endpoint,
        body: &[u8],
        format: WireFormat,
    ) -> ServerResult<Vec<u8>> {
        let request = decode_document(body, format)?;
        let bytes = match endpoint {
            Endpoint::BatchSync => encode(&self.batch_sync(&request)?, format)?,
            Endpoint::ResolveConflicts => encode(&self.resolve_conflicts(&request)?, format)?,
            Endpoint::Status => encode(&self.status(&request)?, format)?,
        };
        Ok(bytes)
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the store.
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    fn ensure_store(&self) -> ServerResult<()> {
        self.store.ping().map_err(|e| {
            error!(error = %e, "store unreachable, rejecting call");
            ServerError::from(e)
        })
    }
}

fn to_document<T: serde::Serialize>(request: &T) -> ServerResult<Value> {
    serde_json::to_value(request).map_err(|e| CodecError::from(e).into())
}
