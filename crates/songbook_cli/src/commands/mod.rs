//! CLI command implementations.

pub mod apply;
pub mod changes;
pub mod inspect;
pub mod resolve;
pub mod status;

use serde::Serialize;
use songbook_store::FileStore;
use songbook_sync_server::{ServerConfig, ServerError, SyncServer};
use std::path::Path;
use std::sync::Arc;

/// Opens the snapshot at `path` behind a server.
pub fn open_server(
    path: &Path,
    config: ServerConfig,
) -> Result<SyncServer, Box<dyn std::error::Error>> {
    let store = FileStore::open(path)?;
    Ok(SyncServer::new(config, Arc::new(store)))
}

/// Prints a call's response, or its error response, as pretty JSON.
pub fn print_outcome<T: Serialize>(
    outcome: Result<T, ServerError>,
) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&err.to_response())?);
            Err(err.into())
        }
    }
}

/// Reads a JSON request document.
pub fn read_document(path: &Path) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
