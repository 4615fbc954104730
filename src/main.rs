/// Main entry point for the Rest Cycle MCP server
///
/// This file sets up logging, parses command line arguments, and starts the MCP server.
/// The server listens for JSON-RPC requests over stdin/stdout following the MCP protocol.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use rest_cycle_mcp::{RestCycleServer, ServerSettings};

/// Get the default database path, falling back through several locations
fn get_default_database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let potential_paths = [
        dirs::home_dir().map(|mut p| {
            p.push(".rest_cycle");
            p
        }),
        dirs::data_dir().map(|mut p| {
            p.push("rest_cycle");
            p
        }),
        std::env::current_dir().ok().map(|mut p| {
            p.push(".rest_cycle");
            p
        }),
    ];

    for potential_path in potential_paths.iter().flatten() {
        if std::fs::create_dir_all(potential_path).is_ok() {
            // Make sure the directory is actually writable
            let probe = potential_path.join(".write_probe");
            if std::fs::write(&probe, "probe").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return Ok(potential_path.join("sleep.db"));
            }
        }
    }

    let mut temp_path = std::env::temp_dir();
    temp_path.push("rest_cycle");
    std::fs::create_dir_all(&temp_path)?;
    temp_path.push("sleep.db");

    tracing::warn!("Using temporary directory for database: {}", temp_path.display());
    Ok(temp_path)
}

/// Command line arguments for the Rest Cycle MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    /// If not provided, uses a default location in the user's home directory
    #[arg(long)]
    database: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,

    /// Seconds a generated insight is served from cache
    #[arg(long, default_value_t = 300)]
    cache_ttl_secs: u64,

    /// Seconds to wait for the external advisor before using rule-based insights
    #[arg(long, default_value_t = 10)]
    advisor_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("rest_cycle_mcp={}", log_level))
        .with_writer(std::io::stderr) // stdout carries the protocol
        .init();

    info!("Starting Rest Cycle MCP server");

    let db_path = match args.database {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => get_default_database_path()?,
    };

    info!("Using database at: {}", db_path.display());

    let settings = ServerSettings {
        cache_ttl: Duration::from_secs(args.cache_ttl_secs),
        advisor_timeout: Duration::from_secs(args.advisor_timeout_secs),
    };

    let server = RestCycleServer::new(db_path, settings).await?;
    server.run().await?;

    info!("Rest Cycle MCP server shutdown complete");
    Ok(())
}
