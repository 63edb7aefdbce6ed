//! Hash-chain digest primitives for HashLedger

use crate::blockchain::Block;
use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// `previous_hash` of the genesis block: the all-zero SHA-256 digest.
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Canonical text form of a block timestamp, e.g. `2026-10-16T09:30:00Z`.
///
/// The same string is hashed, serialized to JSON and stored in SQLite, so a
/// block read back from any of them hashes identically.
pub fn canonical_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Computes the digest of a block's canonical fields.
///
/// The id is hashed as 8 little-endian bytes; every text field is prefixed
/// with its byte length so that `("ab", "c")` and `("a", "bc")` never
/// produce the same input.
pub fn compute_hash(
    id: u64,
    timestamp: &DateTime<Utc>,
    data: &str,
    previous_hash: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.to_le_bytes());
    for field in [canonical_timestamp(timestamp).as_str(), data, previous_hash] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Recomputes the digest of a block from its current field values.
pub fn hash_block(block: &Block) -> String {
    compute_hash(block.id, &block.timestamp, &block.data, &block.previous_hash)
}

/// True if `s` looks like a lowercase hex SHA-256 digest.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
