//! JSON and CBOR wire encoding.
//!
//! Request bodies are first decoded into an untyped document so the server
//! can report every structural problem at once instead of stopping at the
//! first field serde rejects.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug)]
pub enum CodecError {
    /// JSON encoding or decoding failed.
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// CBOR encoding failed.
    #[error("cbor encoding failed: {0}")]
    CborEncode(String),

    /// CBOR decoding failed.
    #[error("cbor decoding failed: {0}")]
    CborDecode(String),
}

/// Body encoding of a request or response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// `application/json`.
    #[default]
    Json,
    /// `application/cbor`.
    Cbor,
}

/// Encodes a message.
pub fn encode<T: Serialize>(message: &T, format: WireFormat) -> CodecResult<Vec<u8>> {
    match format {
        WireFormat::Json => Ok(serde_json::to_vec(message)?),
        WireFormat::Cbor => {
            let mut buf = Vec::new();
            ciborium::ser::into_writer(message, &mut buf)
                .map_err(|e| CodecError::CborEncode(e.to_string()))?;
            Ok(buf)
        }
    }
}

/// Decodes a message into a typed value.
pub fn decode<T: DeserializeOwned>(bytes: &[u8], format: WireFormat) -> CodecResult<T> {
    match format {
        WireFormat::Json => Ok(serde_json::from_slice(bytes)?),
        WireFormat::Cbor => {
            ciborium::de::from_reader(bytes).map_err(|e| CodecError::CborDecode(e.to_string()))
        }
    }
}

/// Decodes a request body into an untyped document tree.
pub fn decode_document(bytes: &[u8], format: WireFormat) -> CodecResult<serde_json::Value> {
    decode(bytes, format)
}
