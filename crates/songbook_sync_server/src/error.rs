//! Error types for the sync server.
//!
//! Only call-level problems live here. Per-operation failures and conflicts
//! are ordinary outcomes and never surface as a [`ServerError`].

use songbook_store::StoreError;
use songbook_sync_protocol::{CodecError, ErrorResponse};
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Every structural problem found in one request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid request: {}", .problems.join("; "))]
pub struct ValidationError {
    /// Problem descriptions, in discovery order.
    pub problems: Vec<String>,
}

/// Errors that fail a whole call.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Malformed request shape, unknown kind, or oversized batch.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store could not be reached; no operation was attempted.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store failed outside any single operation.
    #[error("store error: {0}")]
    Store(StoreError),

    /// The request body could not be decoded, or the response encoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => ServerError::StoreUnavailable(reason),
            other => ServerError::Store(other),
        }
    }
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, ServerError::Validation(_) | ServerError::Codec(_))
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, ServerError::StoreUnavailable(_) | ServerError::Store(_))
    }

    /// Returns the validation problems, if this is a validation error.
    pub fn problems(&self) -> &[String] {
        match self {
            ServerError::Validation(v) => &v.problems,
            _ => &[],
        }
    }

    /// Builds the wire response for this error.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.to_string()).with_problems(self.problems().to_vec())
    }
}
