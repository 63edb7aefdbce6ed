//! Thread-safe ledger store.
//!
//! [`Ledger`] is the single owner of a [`Blockchain`]: writers (`append`,
//! `tamper`) take the exclusive lock, readers (`get`, `get_all`, `verify`)
//! share it and always see fully written blocks. Hand it around as
//! `Arc<Ledger>`.

use crate::blockchain::{Block, Blockchain, VerificationReport};
use crate::error::Result;
use crate::persistence::Persistence;
use parking_lot::RwLock;

pub struct Ledger {
    chain: RwLock<Blockchain>,
}

impl Ledger {
    /// In-memory ledger with a fresh genesis block.
    pub fn new(genesis_data: &str) -> Result<Self> {
        Ok(Self::from_blockchain(Blockchain::new(genesis_data)?))
    }

    /// Ledger over a persistence backend; see
    /// [`Blockchain::new_with_persistence`].
    pub fn open(genesis_data: &str, persistence: Box<dyn Persistence>) -> Result<Self> {
        Ok(Self::from_blockchain(Blockchain::new_with_persistence(
            genesis_data,
            persistence,
        )?))
    }

    pub fn from_blockchain(chain: Blockchain) -> Self {
        Ledger {
            chain: RwLock::new(chain),
        }
    }

    pub fn append(&self, data: &str) -> Result<Block> {
        self.chain.write().append(data)
    }

    pub fn tamper(&self, id: u64, new_data: &str) -> Result<Block> {
        self.chain.write().tamper(id, new_data)
    }

    pub fn get(&self, id: u64) -> Result<Block> {
        self.chain.read().get(id).cloned()
    }

    /// Snapshot of every block in ascending id order.
    pub fn get_all(&self) -> Vec<Block> {
        self.chain.read().blocks().to_vec()
    }

    pub fn tail(&self) -> Result<Block> {
        self.chain.read().tail().cloned()
    }

    pub fn len(&self) -> usize {
        self.chain.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.read().is_empty()
    }

    pub fn verify(&self) -> VerificationReport {
        let report = self.chain.read().verify();
        tracing::debug!(
            valid = report.valid,
            total_blocks = report.total_blocks,
            errors = report.errors.len(),
            "verified ledger"
        );
        report
    }
}
