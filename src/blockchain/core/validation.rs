//! Chain integrity verification.
//!
//! A single forward pass recomputes every block's digest and checks each
//! `previous_hash` against the *recomputed* digest of its predecessor rather
//! than the predecessor's stored `current_hash`. Altering the payload of
//! block `k` therefore surfaces twice: as a hash mismatch on `k` and as a
//! broken link on `k + 1`, whose stored reference still names `k`'s original
//! digest.

use crate::crypto::{hash_block, is_hex_digest, GENESIS_PREVIOUS_HASH};
use serde::{Deserialize, Serialize};

use super::chain::Block;

/// Outcome of a full verification pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub valid: bool,
    pub total_blocks: usize,
    /// Discrepancies in ascending block order; for one block the hash
    /// mismatch comes before the link error.
    pub errors: Vec<String>,
}

/// Verifies the whole sequence and reports every discrepancy found.
pub fn verify_chain(blocks: &[Block]) -> VerificationReport {
    let mut errors = Vec::new();

    if blocks.is_empty() {
        errors.push("Ledger is empty".to_string());
    }

    // (id, recomputed digest) of the block just checked
    let mut predecessor: Option<(u64, String)> = None;

    for block in blocks {
        let expected = hash_block(block);

        if !is_hex_digest(&block.current_hash) {
            errors.push(format!("Block #{}: stored hash is malformed", block.id));
        } else if expected != block.current_hash {
            errors.push(format!("Block #{}: hash mismatch (data altered)", block.id));
        }

        match &predecessor {
            Some((pred_id, pred_expected)) => {
                if block.previous_hash != *pred_expected {
                    errors.push(format!(
                        "Block #{}: previous-hash link broken (chain compromised from block #{})",
                        block.id, pred_id
                    ));
                }
            }
            None => {
                if block.previous_hash != GENESIS_PREVIOUS_HASH {
                    errors.push(format!(
                        "Block #{}: genesis previous-hash is not the sentinel",
                        block.id
                    ));
                }
            }
        }

        predecessor = Some((block.id, expected));
    }

    VerificationReport {
        valid: errors.is_empty(),
        total_blocks: blocks.len(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{Blockchain, DEFAULT_GENESIS_DATA};

    fn three_block_chain() -> Blockchain {
        let mut chain = Blockchain::new(DEFAULT_GENESIS_DATA).unwrap();
        chain.append("A").unwrap();
        chain.append("B").unwrap();
        chain
    }

    #[test]
    fn test_pristine_chain_is_valid() {
        let report = three_block_chain().verify();
        assert_eq!(
            report,
            VerificationReport {
                valid: true,
                total_blocks: 3,
                errors: vec![],
            }
        );
    }

    #[test]
    fn test_single_tamper_propagates_to_successor() {
        let mut chain = three_block_chain();
        chain.tamper(2, "A-modified").unwrap();

        let report = chain.verify();
        assert!(!report.valid);
        assert_eq!(report.total_blocks, 3);
        assert_eq!(
            report.errors,
            vec![
                "Block #2: hash mismatch (data altered)".to_string(),
                "Block #3: previous-hash link broken (chain compromised from block #2)"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_tampering_the_tail_yields_one_error() {
        // The tail has no successor whose link could break.
        let mut chain = three_block_chain();
        chain.tamper(3, "B-modified").unwrap();

        let report = chain.verify();
        assert_eq!(report.errors, vec!["Block #3: hash mismatch (data altered)".to_string()]);
    }

    #[test]
    fn test_link_check_uses_recomputed_predecessor_hash() {
        // Stored links are all intact after a tamper; only the recomputed
        // digest of block 2 disagrees with block 3's reference.
        let mut chain = three_block_chain();
        chain.tamper(2, "A-modified").unwrap();
        let blocks = chain.blocks();

        assert_eq!(blocks[2].previous_hash, blocks[1].current_hash);
        assert!(verify_chain(blocks)
            .errors
            .iter()
            .any(|e| e.starts_with("Block #3: previous-hash link broken")));
    }

    #[test]
    fn test_multiple_tampers_reported_in_order() {
        let mut chain = three_block_chain();
        chain.append("C").unwrap();
        chain.tamper(4, "C-modified").unwrap();
        chain.tamper(2, "A-modified").unwrap();

        let report = chain.verify();
        assert_eq!(
            report.errors,
            vec![
                "Block #2: hash mismatch (data altered)".to_string(),
                "Block #3: previous-hash link broken (chain compromised from block #2)"
                    .to_string(),
                "Block #4: hash mismatch (data altered)".to_string(),
            ]
        );
    }

    #[test]
    fn test_restoring_data_restores_validity() {
        let mut chain = three_block_chain();
        chain.tamper(2, "A-modified").unwrap();
        chain.tamper(2, "A").unwrap();
        assert!(chain.verify().valid);
    }

    #[test]
    fn test_genesis_forbidden_leaves_report_unchanged() {
        let mut chain = three_block_chain();
        let before = chain.verify();

        assert!(chain.tamper(1, "x").is_err());
        assert_eq!(chain.verify(), before);
    }

    #[test]
    fn test_verify_is_idempotent() {
        let mut chain = three_block_chain();
        chain.tamper(2, "A-modified").unwrap();

        let first = serde_json::to_string(&chain.verify()).unwrap();
        let second = serde_json::to_string(&chain.verify()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_bad_genesis_sentinel_reported() {
        let mut blocks = three_block_chain().blocks().to_vec();
        blocks[0].previous_hash = "0".to_string();

        let report = verify_chain(&blocks);
        assert_eq!(
            report.errors,
            vec![
                "Block #1: hash mismatch (data altered)".to_string(),
                "Block #1: genesis previous-hash is not the sentinel".to_string(),
                "Block #2: previous-hash link broken (chain compromised from block #1)"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_malformed_stored_hash_reported() {
        let mut blocks = three_block_chain().blocks().to_vec();
        blocks[1].current_hash = "not-a-digest".to_string();
        blocks[2].current_hash = blocks[2].current_hash.to_uppercase();

        // Block 3 still links to the recomputed digest of block 2.
        let report = verify_chain(&blocks);
        assert_eq!(
            report.errors,
            vec![
                "Block #2: stored hash is malformed".to_string(),
                "Block #3: stored hash is malformed".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_sequence_is_invalid() {
        let report = verify_chain(&[]);
        assert!(!report.valid);
        assert_eq!(report.total_blocks, 0);
        assert_eq!(report.errors, vec!["Ledger is empty".to_string()]);
    }

    #[test]
    fn test_report_json_shape() {
        let json = serde_json::to_value(three_block_chain().verify()).unwrap();
        assert_eq!(json["valid"], true);
        assert_eq!(json["totalBlocks"], 3);
        assert!(json["errors"].as_array().unwrap().is_empty());
    }
}
