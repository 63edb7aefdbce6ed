use crate::crypto::{compute_hash, GENESIS_PREVIOUS_HASH};
use crate::error::{ChainError, Result};
use crate::persistence::{InMemoryPersistence, Persistence};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::validation::{verify_chain, VerificationReport};

pub const GENESIS_ID: u64 = 1;
pub const DEFAULT_GENESIS_DATA: &str = "Genesis Block";
/// Upper bound on a block payload, in characters.
pub const MAX_DATA_LEN: usize = 1000;

/// A single ledger record.
///
/// `current_hash` is computed once, when the block is created, and is never
/// recomputed afterwards. A block whose `data` was changed later no longer
/// hashes to its stored digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub data: String,
    pub previous_hash: String,
    pub current_hash: String,
}

impl Block {
    /// Creates a block stamped with the current time (truncated to whole
    /// seconds) and seals it with its digest.
    pub fn new(id: u64, data: String, previous_hash: String) -> Self {
        Self::with_timestamp(id, Utc::now().trunc_subsecs(0), data, previous_hash)
    }

    pub fn with_timestamp(
        id: u64,
        timestamp: DateTime<Utc>,
        data: String,
        previous_hash: String,
    ) -> Self {
        let current_hash = compute_hash(id, &timestamp, &data, &previous_hash);
        Block {
            id,
            timestamp,
            data,
            previous_hash,
            current_hash,
        }
    }

    pub fn genesis(data: String) -> Self {
        Self::new(GENESIS_ID, data, GENESIS_PREVIOUS_HASH.to_string())
    }

    pub fn is_genesis(&self) -> bool {
        self.id == GENESIS_ID
    }
}

/// Rejects blank or oversized payloads.
pub fn validate_payload(data: &str) -> Result<()> {
    if data.trim().is_empty() {
        return Err(ChainError::InvalidInput(
            "Block data cannot be empty".to_string(),
        ));
    }
    let len = data.chars().count();
    if len > MAX_DATA_LEN {
        return Err(ChainError::InvalidInput(format!(
            "Block data is {} characters long; the maximum is {}",
            len, MAX_DATA_LEN
        )));
    }
    Ok(())
}

/// Checks ids start at 1 and are contiguous.
fn check_structure(blocks: &[Block]) -> Result<()> {
    for (index, block) in blocks.iter().enumerate() {
        let expected = index as u64 + 1;
        if block.id != expected {
            return Err(ChainError::Database(format!(
                "Stored ledger is not contiguous: expected block #{}, found #{}",
                expected, block.id
            )));
        }
    }
    Ok(())
}

/// The ordered block sequence together with its persistence backend.
///
/// Not synchronized on its own; [`Ledger`](crate::ledger::Ledger) wraps it in
/// a reader/writer lock for shared use.
pub struct Blockchain {
    blocks: Vec<Block>,
    persistence: Box<dyn Persistence>,
}

impl Blockchain {
    /// Create a new `Blockchain` using an in-memory persistence backend.
    pub fn new(genesis_data: &str) -> Result<Self> {
        Self::new_with_persistence(genesis_data, Box::new(InMemoryPersistence::new()))
    }

    /// Create a `Blockchain` over the provided persistence backend.
    ///
    /// An empty backend gets a fresh genesis block; otherwise the stored
    /// history is loaded as-is, including any tampered payloads.
    pub fn new_with_persistence(
        genesis_data: &str,
        persistence: Box<dyn Persistence>,
    ) -> Result<Self> {
        let mut blocks = persistence.load_blocks()?;

        if blocks.is_empty() {
            validate_payload(genesis_data)?;
            let genesis = Block::genesis(genesis_data.to_string());
            persistence.save_block(&genesis)?;
            info!(hash = %genesis.current_hash, "created genesis block");
            blocks.push(genesis);
        } else {
            check_structure(&blocks)?;
            info!(blocks = blocks.len(), "loaded ledger from persistence");
        }

        Ok(Blockchain {
            blocks,
            persistence,
        })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tail(&self) -> Result<&Block> {
        self.blocks
            .last()
            .ok_or_else(|| ChainError::Database("Ledger has no genesis block".to_string()))
    }

    fn index_of(&self, id: u64) -> Result<usize> {
        let tail_id = self.tail()?.id;
        if id == 0 || id > tail_id {
            return Err(ChainError::NotFound(id));
        }
        Ok((id - 1) as usize)
    }

    pub fn get(&self, id: u64) -> Result<&Block> {
        let index = self.index_of(id)?;
        Ok(&self.blocks[index])
    }

    /// Appends a new block linked to the current tail.
    ///
    /// The block is persisted before it becomes visible, so a storage
    /// failure leaves the chain unchanged.
    pub fn append(&mut self, data: &str) -> Result<Block> {
        validate_payload(data)?;

        let tail = self.tail()?;
        let block = Block::new(tail.id + 1, data.to_string(), tail.current_hash.clone());

        self.persistence.save_block(&block)?;
        self.blocks.push(block.clone());

        info!(id = block.id, hash = %block.current_hash, "appended block");
        Ok(block)
    }

    /// Overwrites the payload of an existing block without recomputing its
    /// hash or touching any other block.
    ///
    /// This exists to demonstrate tamper detection; only `data` changes.
    pub fn tamper(&mut self, id: u64, new_data: &str) -> Result<Block> {
        if id == GENESIS_ID {
            return Err(ChainError::Forbidden(
                "The genesis block cannot be modified".to_string(),
            ));
        }
        let index = self.index_of(id)?;
        validate_payload(new_data)?;

        self.persistence.update_block_data(id, new_data)?;
        let block = &mut self.blocks[index];
        block.data = new_data.to_string();

        warn!(id, "block data overwritten without rehashing");
        Ok(block.clone())
    }

    pub fn verify(&self) -> VerificationReport {
        verify_chain(&self.blocks)
    }
}
