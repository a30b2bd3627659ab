//! Preference file inspector
//!
//! Loads a preference file and prints its entries with order annotations.
//! Useful for checking what a store actually persisted without starting
//! the owning application.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{Level as TraceLevel, debug};
use tracing_subscriber::FmtSubscriber;

use prefstore::constants::keys;
use prefstore::store::persist;

#[derive(Parser)]
#[command(name = "prefdump", about = "Print the contents of a preference file")]
struct Args {
    /// Path to a preference file
    path: Option<PathBuf>,

    /// File name resolved under the platform config directory instead of a path
    #[arg(long)]
    name: Option<String>,
}

fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "warn".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "info" => TraceLevel::INFO,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let path = match (args.path, args.name) {
        (Some(path), None) => path,
        (None, Some(name)) => persist::resolve_path(None, &name),
        (Some(_), Some(_)) => bail!("give either a path or --name, not both"),
        (None, None) => bail!("give a file path or --name"),
    };

    let text = std::fs::read_to_string(&path)
        .context(format!("Failed to read {}", path.display()))?;
    let map = persist::from_document(&text)
        .context(format!("Failed to parse {}", path.display()))?;
    debug!(path = %path.display(), entries = map.len(), "loaded preference file");

    for (key, value) in map.iter() {
        if key.starts_with(keys::ORDER_PREFIX) {
            continue;
        }
        match map.get(&format!("{}{key}", keys::ORDER_PREFIX)) {
            Some(order) => println!("{key} = {value}  (order {order})"),
            None => println!("{key} = {value}"),
        }
    }
    Ok(())
}
