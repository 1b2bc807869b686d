//! Block production engine
//!
//! Produces one synthetic block per tick on top of the current chain tip and
//! hands it to a single subscriber through a one-slot channel. A slow
//! subscriber stalls production; cancellation closes the stream.

use crate::blockchain::{validate_seed, Block, GENESIS_HEIGHT};
use crate::crypto::make_hash;
use crate::error::{ChainError, Result};
use crate::transaction::{Event, Transaction};
use num_bigint::BigUint;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A height divisible by this carries no transactions.
pub const TRANSACTION_CYCLE: u64 = 10;
pub const TRANSFER_SENDER: &str = "0xDEADBEEF";
pub const TRANSFER_RECEIVER: &str = "0xBAAAAAAD";
pub const TRANSFER_FEE: u64 = 10_000;
pub const AMOUNT_STEP: u64 = 1_000_000_000;
/// Above this the tick period rounds down to zero nanoseconds.
pub const MAX_BLOCK_RATE: u32 = 1_000_000_000;

pub struct Engine {
    block_interval: Duration,
    prev_block: Option<Block>,
    block_tx: mpsc::Sender<Block>,
    block_rx: Option<mpsc::Receiver<Block>>,
}

impl Engine {
    /// `rate` is the number of blocks per second, between 1 and
    /// [`MAX_BLOCK_RATE`].
    pub fn new(rate: u32) -> Result<Self> {
        if rate == 0 || rate > MAX_BLOCK_RATE {
            return Err(ChainError::InvalidBlockRate(rate));
        }

        let (block_tx, block_rx) = mpsc::channel(1);

        Ok(Engine {
            block_interval: Duration::from_secs(1) / rate,
            prev_block: None,
            block_tx,
            block_rx: Some(block_rx),
        })
    }

    /// Sets the chain tip production resumes from. `None` starts a fresh
    /// chain at height 1.
    pub fn initialize(&mut self, seed: Option<Block>) -> Result<()> {
        if let Some(block) = &seed {
            validate_seed(block)?;
        }
        self.prev_block = seed;
        Ok(())
    }

    pub fn block_interval(&self) -> Duration {
        self.block_interval
    }

    pub fn tip(&self) -> Option<&Block> {
        self.prev_block.as_ref()
    }

    /// Hands out the output stream. Only the first call succeeds.
    pub fn subscription(&mut self) -> Result<mpsc::Receiver<Block>> {
        self.block_rx.take().ok_or(ChainError::AlreadySubscribed)
    }

    /// Runs until `cancel` fires or the subscriber goes away. Consumes the
    /// engine so the stream is closed on return.
    pub async fn start_block_production(mut self, cancel: CancellationToken) {
        info!(interval = ?self.block_interval, "starting block producer");

        let mut ticker = interval_at(Instant::now() + self.block_interval, self.block_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let block = self.create_block();
                    let height = block.height;

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        sent = self.block_tx.send(block) => {
                            if sent.is_err() {
                                debug!(height, "subscriber dropped, stopping");
                                break;
                            }
                        }
                    }
                }
            }
        }

        info!("stopping block producer");
    }

    /// Synthesizes the next block and makes it the new tip.
    pub fn create_block(&mut self) -> Block {
        let height = self
            .prev_block
            .as_ref()
            .map_or(GENESIS_HEIGHT, |b| b.height + 1);

        let transactions = (0..height % TRANSACTION_CYCLE)
            .map(|i| synthetic_transfer(height, i))
            .collect();

        let block = Block::new(height, self.prev_block.as_ref(), transactions);
        self.prev_block = Some(block.clone());
        block
    }
}

fn synthetic_transfer(height: u64, index: u64) -> Transaction {
    Transaction::transfer(
        make_hash(format!("{}-{}", height, index)),
        TRANSFER_SENDER,
        TRANSFER_RECEIVER,
        BigUint::from(index) * BigUint::from(AMOUNT_STEP),
        BigUint::from(TRANSFER_FEE),
    )
    .with_event(Event::new("token_transfer").with_attribute("foo", "bar"))
}
