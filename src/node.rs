use crate::config::Config;
use crate::engine::Engine;
use crate::error::{ChainError, Result};
use crate::instrumentation::Instrumentation;
use crate::persistence::{Database, InMemoryPersistence, Persistence};
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Wires the block store, the production engine and instrumentation
/// together.
pub struct Node<W: Write> {
    pub config: Config,
    pub persistence: Arc<dyn Persistence>,
    instrumentation: Instrumentation<W>,
}

impl<W: Write> Node<W> {
    /// Opens the store under `config.node.store_dir`, falling back to
    /// in-memory persistence if it cannot be opened.
    pub fn init(config: Config, sink: W) -> Result<Self> {
        config.validate()?;

        let persistence: Arc<dyn Persistence> = match Database::open_in_dir(&config.node.store_dir) {
            Ok(db) => {
                info!(store_dir = %config.node.store_dir.display(), "opened block store");
                Arc::new(db)
            }
            Err(e) => {
                warn!(
                    store_dir = %config.node.store_dir.display(),
                    error = %e,
                    "failed to open block store, falling back to in-memory persistence"
                );
                Arc::new(InMemoryPersistence::new())
            }
        };

        Ok(Self::with_persistence(config, persistence, sink))
    }

    pub fn with_persistence(config: Config, persistence: Arc<dyn Persistence>, sink: W) -> Self {
        let instrumentation = Instrumentation::new(&config.instrumentation, sink);
        Node {
            config,
            persistence,
            instrumentation,
        }
    }

    /// Produces blocks until `cancel` fires, persisting and instrumenting
    /// each one. Returns the number of blocks handled.
    ///
    /// Saving runs the store's blocking SQLite call on this task. The engine
    /// waits on the one-slot handoff meanwhile, so a slow disk only delays
    /// the next block. `block_in_place` is not used because it panics on a
    /// current-thread runtime.
    pub async fn start(&mut self, cancel: CancellationToken) -> Result<u64> {
        let seed = self.persistence.load_latest_block()?;
        match &seed {
            Some(block) => info!(height = block.height, "resuming from stored chain tip"),
            None => info!("no stored blocks, starting a fresh chain"),
        }

        let mut engine = Engine::new(self.config.node.block_rate)?;
        engine.initialize(seed)?;
        let mut blocks = engine.subscription()?;

        let producer = tokio::spawn(engine.start_block_production(cancel.clone()));

        let mut produced = 0u64;
        let outcome = loop {
            let block = match blocks.recv().await {
                Some(block) => block,
                None => break Ok(()),
            };

            if let Err(e) = self
                .persistence
                .save_block(&block)
                .and_then(|_| self.instrumentation.emit_block(&block))
            {
                break Err(e);
            }

            produced += 1;
            debug!(
                height = block.height,
                hash = %block.hash,
                txs = block.transactions.len(),
                "block produced"
            );
        };

        if outcome.is_err() {
            cancel.cancel();
        }
        drop(blocks);

        producer
            .await
            .map_err(|e| ChainError::IoError(format!("block producer task failed: {}", e)))?;

        outcome?;
        info!(produced, "node stopped");
        Ok(produced)
    }

    pub fn into_sink(self) -> Option<W> {
        self.instrumentation.into_inner()
    }
}
