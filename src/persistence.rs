//! Database persistence layer for HashLedger

use crate::blockchain::Block;
use crate::crypto::canonical_timestamp;
use crate::error::{ChainError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// Abstraction for persistence backends.
///
/// The ledger calls a backend before changing its in-memory state, so an
/// error returned here aborts the operation with nothing modified.
pub trait Persistence: Send + Sync {
    /// All stored blocks in ascending id order.
    fn load_blocks(&self) -> Result<Vec<Block>>;
    fn save_block(&self, block: &Block) -> Result<()>;
    /// Overwrites the payload of a stored block, leaving its hashes alone.
    fn update_block_data(&self, id: u64, data: &str) -> Result<()>;
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (or creates) a SQLite database. `":memory:"` gives a private
    /// in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| ChainError::Database(format!("Failed to open database: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS blocks (
                id INTEGER PRIMARY KEY,
                timestamp TEXT NOT NULL,
                data TEXT NOT NULL,
                previous_hash TEXT NOT NULL,
                current_hash TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| ChainError::Database(format!("Failed to create blocks table: {}", e)))?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ChainError::Database("Mutex poisoned".to_string()))
    }

    pub fn save_block(&self, block: &Block) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO blocks (id, timestamp, data, previous_hash, current_hash)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                block.id as i64,
                canonical_timestamp(&block.timestamp),
                block.data,
                block.previous_hash,
                block.current_hash,
            ],
        )
        .map_err(|e| ChainError::Database(format!("Failed to save block #{}: {}", block.id, e)))?;

        Ok(())
    }

    pub fn update_block_data(&self, id: u64, data: &str) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE blocks SET data = ?1 WHERE id = ?2",
                params![data, id as i64],
            )
            .map_err(|e| ChainError::Database(format!("Failed to update block #{}: {}", id, e)))?;

        if changed == 0 {
            return Err(ChainError::NotFound(id));
        }
        Ok(())
    }

    pub fn load_blocks(&self) -> Result<Vec<Block>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, timestamp, data, previous_hash, current_hash
                 FROM blocks ORDER BY id ASC",
            )
            .map_err(|e| ChainError::Database(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                let timestamp_text: String = row.get(1)?;
                let timestamp = DateTime::parse_from_rfc3339(&timestamp_text)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            1,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;

                Ok(Block {
                    id: id as u64,
                    timestamp,
                    data: row.get(2)?,
                    previous_hash: row.get(3)?,
                    current_hash: row.get(4)?,
                })
            })
            .map_err(|e| ChainError::Database(format!("Failed to query blocks: {}", e)))?;

        let mut blocks = Vec::new();
        for row in rows {
            blocks.push(
                row.map_err(|e| ChainError::Database(format!("Failed to load block: {}", e)))?,
            );
        }
        Ok(blocks)
    }
}

// Implement the Persistence trait for the rusqlite-backed Database
impl Persistence for Database {
    fn load_blocks(&self) -> Result<Vec<Block>> {
        Database::load_blocks(self)
    }

    fn save_block(&self, block: &Block) -> Result<()> {
        Database::save_block(self, block)
    }

    fn update_block_data(&self, id: u64, data: &str) -> Result<()> {
        Database::update_block_data(self, id, data)
    }
}

/// Simple in-memory persistence implementation useful for tests and ephemeral runs.
///
/// Clones share the same storage, so a ledger can be reopened over a clone.
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    pub blocks: Arc<Mutex<Vec<Block>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Block>>> {
        self.blocks
            .lock()
            .map_err(|_| ChainError::Database("Mutex poisoned".to_string()))
    }
}

impl Persistence for InMemoryPersistence {
    fn load_blocks(&self) -> Result<Vec<Block>> {
        let mut blocks = self.lock()?.clone();
        blocks.sort_by_key(|b| b.id);
        Ok(blocks)
    }

    fn save_block(&self, block: &Block) -> Result<()> {
        let mut blocks = self.lock()?;
        if blocks.iter().any(|b| b.id == block.id) {
            return Err(ChainError::Database(format!(
                "Block #{} already stored",
                block.id
            )));
        }
        blocks.push(block.clone());
        Ok(())
    }

    fn update_block_data(&self, id: u64, data: &str) -> Result<()> {
        let mut blocks = self.lock()?;
        let block = blocks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(ChainError::NotFound(id))?;
        block.data = data.to_string();
        Ok(())
    }
}
