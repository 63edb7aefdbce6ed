//! Error types for HashLedger

/// Errors raised by the ledger store, its persistence backends and the
/// configuration layer.
///
/// Integrity problems found by the verifier are never errors; they are
/// reported as data in a [`VerificationReport`](crate::blockchain::VerificationReport).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Block #{0} not found")]
    NotFound(u64),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChainError {
    /// True for failures that are not the caller's fault (storage, IO or
    /// configuration).
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ChainError::Database(_)
                | ChainError::Io(_)
                | ChainError::Config(_)
        )
    }
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Io(err.to_string())
    }
}

impl From<rusqlite::Error> for ChainError {
    fn from(err: rusqlite::Error) -> Self {
        ChainError::Database(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
