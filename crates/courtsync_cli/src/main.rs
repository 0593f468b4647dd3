//! CourtSync CLI
//!
//! Operator controls for the CourtSync sync engine.
//!
//! # Commands
//!
//! - `set-id` - Set the sync identifier shared by the venue's devices
//! - `clear-id` - Remove the sync identifier (stop syncing)
//! - `status` - Show identifier, cursor, aggregate counts, indicator
//! - `pull` / `push` / `force-pull` - One-shot sync operations
//! - `watch` - Run the scheduler in the foreground until killed

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CourtSync operator command-line tools.
#[derive(Parser)]
#[command(name = "courtsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the local data directory
    #[arg(global = true, long, default_value = "./courtsync-data")]
    data_dir: PathBuf,

    /// Base URL of the remote blob endpoint
    #[arg(global = true, long, default_value = "https://kvdb.io")]
    base_url: String,

    /// Bucket path segment under the base URL
    #[arg(global = true, long, default_value = "courtsync")]
    bucket: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the sync identifier shared by this venue's devices
    SetId {
        /// Raw identifier; normalized to lowercase a-z0-9 before use
        id: String,
    },

    /// Remove the sync identifier and stop syncing
    ClearId,

    /// Show identifier, cursor, aggregate counts, and sync indicator
    Status {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Read the remote snapshot and converge on it
    Pull,

    /// Publish the local state to the remote
    Push,

    /// Adopt the remote snapshot regardless of recency
    ForcePull,

    /// Run the scheduler in the foreground until killed
    Watch,

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
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let endpoint = commands::Endpoint {
        data_dir: cli.data_dir,
        base_url: cli.base_url,
        bucket: cli.bucket,
    };

    match cli.command {
        Commands::SetId { id } => commands::identity::set(&endpoint, &id)?,
        Commands::ClearId => commands::identity::clear(&endpoint)?,
        Commands::Status { format } => commands::status::run(&endpoint, &format)?,
        Commands::Pull => commands::sync::run(&endpoint, commands::sync::Operation::Pull)?,
        Commands::Push => commands::sync::run(&endpoint, commands::sync::Operation::Push)?,
        Commands::ForcePull => {
            commands::sync::run(&endpoint, commands::sync::Operation::ForcePull)?;
        }
        Commands::Watch => commands::watch::run(&endpoint)?,
        Commands::Version => {
            println!("CourtSync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
