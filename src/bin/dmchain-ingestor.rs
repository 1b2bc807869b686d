#![forbid(unsafe_code)]
//! Reads DMLOG instrumentation from stdin, a single file or a logs directory
//! and prints every decoded object.

use clap::Parser;
use dmchain::config::{load_config, DEFAULT_CONFIG_PATH};
use dmchain::ingestor::{Ingestor, LineFeed};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "dmchain-ingestor", about = "Reconstruct blocks from DMLOG instrumentation")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Single instrumentation log to read (takes precedence over --logs-dir)
    #[arg(long)]
    file: Option<PathBuf>,
    /// Directory where instrumentation logs are stored (stdin when unset)
    #[arg(long)]
    logs_dir: Option<PathBuf>,
    /// File name suffix of the log files
    #[arg(long)]
    logs_pattern: Option<String>,
    /// Protocol tag prefix
    #[arg(long)]
    prefix: Option<String>,
    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(dir) = cli.logs_dir {
        config.ingestor.logs_dir = Some(dir);
    }
    if let Some(pattern) = cli.logs_pattern {
        config.ingestor.logs_pattern = pattern;
    }
    if let Some(prefix) = cli.prefix {
        config.ingestor.prefix = prefix;
    }
    config.validate()?;

    let level: Level = cli.log_level.parse()?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let feed = match cli.file {
        Some(path) => LineFeed::file(path),
        None => LineFeed::from_config(&config.ingestor)?,
    };
    let stats = Ingestor::new(&config.ingestor)
        .run(feed, |decoded| println!("Data: {}", decoded))
        .await?;

    eprintln!(
        "ingested {} blocks, {} transactions, {} closed brackets",
        stats.blocks, stats.transactions, stats.closed_blocks
    );
    Ok(())
}
