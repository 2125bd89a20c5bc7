//! Songbook sync CLI
//!
//! Runs the sync engine against a file-backed store.
//!
//! # Commands
//!
//! - `apply` - Apply a BatchSync request file
//! - `resolve` - Apply a ResolveConflicts request file
//! - `changes` - Print the catch-up feed
//! - `status` - Look up operation ids
//! - `inspect` - Display store statistics

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Songbook offline-sync tools.
#[derive(Parser)]
#[command(name = "songbook-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store snapshot file
    #[arg(global = true, short, long)]
    store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a BatchSync request and print the response
    Apply {
        /// Request file
        request: PathBuf,

        /// Maximum operations per batch
        #[arg(short, long, default_value_t = songbook_sync_server::DEFAULT_MAX_BATCH_SIZE)]
        max_batch: usize,

        /// Request file is CBOR; the response is printed as JSON
        #[arg(long)]
        cbor: bool,

        /// Omit the catch-up feed from the response
        #[arg(long)]
        no_catch_up: bool,
    },

    /// Apply a ResolveConflicts request and print the response
    Resolve {
        /// Request file
        request: PathBuf,
    },

    /// Print records modified after a timestamp
    Changes {
        /// Milliseconds since the epoch; without it the feed is empty
        #[arg(long)]
        since: Option<u64>,
    },

    /// Look up operation ids
    Status {
        /// Operation ids
        ids: Vec<String>,
    },

    /// Display store statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("songbook-sync v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let path = cli.store.ok_or("--store is required")?;
    match cli.command {
        Commands::Apply {
            request,
            max_batch,
            cbor,
            no_catch_up,
        } => {
            commands::apply::run(&path, &request, max_batch, cbor, !no_catch_up)?;
        }
        Commands::Resolve { request } => {
            commands::resolve::run(&path, &request)?;
        }
        Commands::Changes { since } => {
            commands::changes::run(&path, since)?;
        }
        Commands::Status { ids } => {
            commands::status::run(&path, ids)?;
        }
        Commands::Inspect { format } => {
            commands::inspect::run(&path, &format)?;
        }
        Commands::Version => {}
    }

    Ok(())
}
