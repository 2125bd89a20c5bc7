//! Inspect command implementation.

use serde::Serialize;
use songbook_store::{EntityStore, FileStore};
use songbook_sync_protocol::{EntityKind, Timestamp};
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Snapshot path.
    pub path: String,
    /// Snapshot file size in bytes.
    pub file_size: u64,
    /// Per-kind statistics.
    pub collections: Vec<CollectionStats>,
}

/// Statistics for a single entity kind.
#[derive(Debug, Serialize)]
pub struct CollectionStats {
    /// Entity kind.
    pub kind: EntityKind,
    /// Number of records.
    pub record_count: usize,
    /// Most recent `lastModified`, if any record exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No store found at {:?}", path).into());
    }

    let result = inspect(path)?;
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let store = FileStore::open(path)?;
    let mut collections = Vec::new();
    for kind in EntityKind::ALL {
        let records = store.modified_since(kind, Timestamp::EPOCH)?;
        collections.push(CollectionStats {
            kind,
            record_count: store.count(kind)?,
            last_modified: records.last().map(|r| r.last_modified),
        });
    }

    Ok(InspectResult {
        path: path.display().to_string(),
        file_size: std::fs::metadata(path)?.len(),
        collections,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("Store: {}", result.path);
    println!("Size:  {} bytes", result.file_size);
    println!();
    for c in &result.collections {
        match c.last_modified {
            Some(t) => println!("{:<12} {:>6} records, last modified {}", c.kind.as_str(), c.record_count, t),
            None => println!("{:<12} {:>6} records", c.kind.as_str(), c.record_count),
        }
    }
}
