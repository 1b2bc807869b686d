use crate::crypto::make_hash;
use crate::transaction::Transaction;
use chrono::{DateTime, Utc};

/// Height of the first block of a fresh chain.
pub const GENESIS_HEIGHT: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub height: u64,
    pub hash: String,
    pub prev_hash: String,
    pub timestamp: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Builds the block at `height` on top of `prev`, stamped with the
    /// current time. With no predecessor the previous hash is
    /// `make_hash(GENESIS_HEIGHT)`.
    pub fn new(height: u64, prev: Option<&Block>, transactions: Vec<Transaction>) -> Self {
        let prev_hash = match prev {
            Some(prev) => prev.hash.clone(),
            None => make_hash(GENESIS_HEIGHT),
        };

        Block {
            height,
            hash: make_hash(height),
            prev_hash,
            timestamp: Utc::now(),
            transactions,
        }
    }
}
