//! Apply command implementation.

use super::{open_server, print_outcome};
use songbook_sync_protocol::{decode, BatchSyncResponse, WireFormat};
use songbook_sync_server::{Endpoint, ServerConfig};
use std::path::Path;

/// Runs the apply command.
pub fn run(
    store: &Path,
    request: &Path,
    max_batch: usize,
    cbor: bool,
    catch_up: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::new()
        .with_max_batch_size(max_batch)
        .with_catch_up(catch_up);
    let server = open_server(store, config)?;

    let format = if cbor {
        WireFormat::Cbor
    } else {
        WireFormat::Json
    };
    let body = std::fs::read(request)?;

    let outcome = server
        .handle_bytes(Endpoint::BatchSync, &body, format)
        .and_then(|bytes| Ok(decode::<BatchSyncResponse>(&bytes, format)?));
    print_outcome(outcome)
}
