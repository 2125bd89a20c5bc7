//! Changes command implementation.

use super::open_server;
use songbook_sync_protocol::{ChangeEntry, Timestamp};
use songbook_sync_server::ServerConfig;
use std::path::Path;

/// Runs the changes command.
///
/// Without `since` the feed is empty, as for a client that never synced.
pub fn run(store: &Path, since: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let changes = feed(store, since)?;
    println!("{}", serde_json::to_string_pretty(&changes)?);
    Ok(())
}

fn feed(store: &Path, since: Option<u64>) -> Result<Vec<ChangeEntry>, Box<dyn std::error::Error>> {
    let server = open_server(store, ServerConfig::default())?;
    Ok(server.changes_since(since.map(Timestamp::from_millis))?)
}
