//! Block store for DMChain
//!
//! The node persists every produced block here and reads the latest one back
//! as the engine's seed on restart.

use crate::blockchain::{validate_link, Block};
use crate::error::ChainError;
use crate::transaction::Transaction;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// File name of the SQLite store inside the node's store directory.
pub const DATABASE_FILE: &str = "blocks.db";

/// Abstraction for persistence backends. `save_block` only accepts a block
/// that links onto the latest stored one.
pub trait Persistence: Send + Sync {
    fn save_block(&self, block: &Block) -> Result<(), ChainError>;
    fn load_block(&self, height: u64) -> Result<Option<Block>, ChainError>;
    fn load_latest_block(&self) -> Result<Option<Block>, ChainError>;
    fn block_count(&self) -> Result<u64, ChainError>;
}

pub struct Database {
    conn: Mutex<Connection>,
}

type StoredRow = (i64, String, String, String, String);

const SELECT_COLUMNS: &str = "SELECT height, hash, prev_hash, timestamp, transactions FROM blocks";

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ChainError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| ChainError::DatabaseError(format!("Failed to open database: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS blocks (
                height INTEGER PRIMARY KEY,
                hash TEXT NOT NULL,
                prev_hash TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                transactions TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| ChainError::DatabaseError(format!("Failed to create blocks table: {}", e)))?;

        Ok(Database { conn: Mutex::new(conn) })
    }

    /// Opens `<store_dir>/blocks.db`, creating the directory if needed.
    pub fn open_in_dir(store_dir: impl AsRef<Path>) -> Result<Self, ChainError> {
        let store_dir = store_dir.as_ref();
        fs::create_dir_all(store_dir).map_err(|e| {
            ChainError::DatabaseError(format!(
                "Failed to create store dir {}: {}",
                store_dir.display(),
                e
            ))
        })?;
        Self::open(store_dir.join(DATABASE_FILE))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, ChainError> {
        self.conn
            .lock()
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))
    }

    fn query_one(
        conn: &Connection,
        sql: &str,
        height: Option<i64>,
    ) -> Result<Option<Block>, ChainError> {
        let read_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<StoredRow> {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        };

        let stored = match height {
            Some(height) => conn.query_row(sql, params![height], read_row),
            None => conn.query_row(sql, [], read_row),
        }
        .optional()?;

        stored.map(row_to_block).transpose()
    }

    fn latest(conn: &Connection) -> Result<Option<Block>, ChainError> {
        let sql = format!("{} ORDER BY height DESC LIMIT 1", SELECT_COLUMNS);
        Self::query_one(conn, &sql, None)
    }
}

fn row_to_block(
    (height, hash, prev_hash, timestamp, transactions_json): StoredRow,
) -> Result<Block, ChainError> {
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| ChainError::DatabaseError(format!("Failed to parse timestamp: {}", e)))?
        .with_timezone(&Utc);

    let transactions: Vec<Transaction> = serde_json::from_str(&transactions_json)?;

    Ok(Block {
        height: height as u64,
        hash,
        prev_hash,
        timestamp,
        transactions,
    })
}

impl Persistence for Database {
    fn save_block(&self, block: &Block) -> Result<(), ChainError> {
        let transactions_json = serde_json::to_string(&block.transactions)?;

        let conn = self.lock()?;
        validate_link(Self::latest(&conn)?.as_ref(), block)?;

        conn.execute(
            "INSERT OR REPLACE INTO blocks (height, hash, prev_hash, timestamp, transactions)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                block.height as i64,
                block.hash,
                block.prev_hash,
                block.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
                transactions_json,
            ],
        )?;

        Ok(())
    }

    fn load_block(&self, height: u64) -> Result<Option<Block>, ChainError> {
        let conn = self.lock()?;
        let sql = format!("{} WHERE height = ?1", SELECT_COLUMNS);
        Self::query_one(&conn, &sql, Some(height as i64))
    }

    fn load_latest_block(&self) -> Result<Option<Block>, ChainError> {
        let conn = self.lock()?;
        Self::latest(&conn)
    }

    fn block_count(&self) -> Result<u64, ChainError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Simple in-memory persistence implementation useful for tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    pub blocks: Arc<Mutex<BTreeMap<u64, Block>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<u64, Block>>, ChainError> {
        self.blocks
            .lock()
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))
    }
}

impl Persistence for InMemoryPersistence {
    fn save_block(&self, block: &Block) -> Result<(), ChainError> {
        let mut blocks = self.lock()?;
        validate_link(blocks.values().next_back(), block)?;
        blocks.insert(block.height, block.clone());
        Ok(())
    }

    fn load_block(&self, height: u64) -> Result<Option<Block>, ChainError> {
        Ok(self.lock()?.get(&height).cloned())
    }

    fn load_latest_block(&self) -> Result<Option<Block>, ChainError> {
        Ok(self.lock()?.values().next_back().cloned())
    }

    fn block_count(&self) -> Result<u64, ChainError> {
        Ok(self.lock()?.len() as u64)
    }
}
