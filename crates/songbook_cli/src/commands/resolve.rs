//! Resolve command implementation.

use super::{open_server, print_outcome, read_document};
use songbook_sync_server::ServerConfig;
use std::path::Path;

/// Runs the resolve command.
pub fn run(store: &Path, request: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let server = open_server(store, ServerConfig::default())?;
    let document = read_document(request)?;
    print_outcome(server.resolve_conflicts(&document))
}
