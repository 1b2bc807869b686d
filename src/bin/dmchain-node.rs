#![forbid(unsafe_code)]
//! Block producer node for DMChain
//!
//! Instrumentation lines go to stdout, logs go to stderr. Set `DM_ENABLED=1`
//! to turn instrumentation on without touching the config file.

use clap::Parser;
use dmchain::config::{load_config, DEFAULT_CONFIG_PATH};
use dmchain::node::Node;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "dmchain-node", about = "Produce blocks and emit DMLOG instrumentation")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Directory to store blocks data
    #[arg(long)]
    store_dir: Option<PathBuf>,
    /// Number of blocks to produce per second
    #[arg(long)]
    block_rate: Option<u32>,
    /// Log level
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(store_dir) = cli.store_dir {
        config.node.store_dir = store_dir;
    }
    if let Some(rate) = cli.block_rate {
        config.node.block_rate = rate;
    }
    if let Some(level) = cli.log_level {
        config.node.log_level = level;
    }
    if std::env::var("DM_ENABLED").as_deref() == Ok("1") {
        config.instrumentation.enabled = true;
    }

    let level: Level = config.node.log_level.parse()?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut node = Node::init(config, std::io::stdout())?;

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        info!(signal, "shutting down");
        stopper.cancel();
    });

    node.start(cancel).await?;
    info!("node terminated");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = term.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "ctrl-c"
}
