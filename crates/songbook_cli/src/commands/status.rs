//! Status command implementation.

use super::{open_server, print_outcome};
use songbook_sync_protocol::StatusRequest;
use songbook_sync_server::ServerConfig;
use std::path::Path;

/// Runs the status command.
pub fn run(store: &Path, ids: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let server = open_server(store, ServerConfig::default())?;
    print_outcome(server.lookup(&StatusRequest { operation_ids: ids }))
}
