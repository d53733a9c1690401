//! Intra-block dependency resolution
//!
//! A block's transaction list carries no ordering guarantee, yet a
//! transaction may spend an output mined in the same block. Each pass
//! partitions the working set into transactions whose inputs are resolvable
//! against the current UTXO set ("connected") and transactions that spend a
//! sibling still in the working set ("orphans"). Connected transactions are
//! verified, which makes their outputs visible to the next pass. An explicit
//! worklist loop with an iteration bound replaces call-stack recursion, so
//! the bound and any unresolved remainder are inspectable results.

use crate::error::Result;
use crate::types::{BlockHeight, RawTransaction, TxId};
use crate::utxo_set::UtxoSet;
use crate::verifier::{verify_transaction, BurnEvent, TokenTx, TxVerification};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Result of resolving all transactions of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockResolution {
    pub height: BlockHeight,
    /// Transactions that spent token value, in resolution order.
    pub token_txs: Vec<TokenTx>,
    /// All burns produced by this block.
    pub burns: Vec<BurnEvent>,
    /// Transactions still unresolved when the iteration bound was hit (or
    /// when no pass could make progress). They carry no token value for this
    /// block.
    pub unresolved: Vec<TxId>,
}

/// Transaction ids of the working set that are spent by another transaction
/// in the same working set.
fn intra_block_spending_tx_ids(txs: &[&RawTransaction]) -> HashSet<TxId> {
    let id_set: HashSet<&str> = txs.iter().map(|tx| tx.tx_id.as_str()).collect();
    txs.iter()
        .flat_map(|tx| tx.inputs.iter())
        .filter(|input| id_set.contains(input.spending_tx_id.as_str()))
        .map(|input| input.spending_tx_id.clone())
        .collect()
}

/// Resolve one block's transactions against the ledger, in dependency order.
///
/// `max_iterations` bounds the number of passes; the first pass counts as
/// iteration zero. Transactions left over at the bound are reported in
/// [`BlockResolution::unresolved`], never verified.
pub fn resolve_block(
    txs: &[RawTransaction],
    height: BlockHeight,
    max_iterations: u32,
    utxo_set: &mut UtxoSet,
) -> Result<BlockResolution> {
    let mut working: Vec<&RawTransaction> = txs.iter().collect();
    let mut token_txs = Vec::new();
    let mut burns = Vec::new();
    let mut unresolved = Vec::new();
    let mut iteration = 0u32;

    while !working.is_empty() {
        let spent_sibling_ids = intra_block_spending_tx_ids(&working);

        let mut connected = Vec::new();
        let mut orphans = Vec::new();
        for tx in working {
            let spends_sibling = tx
                .inputs
                .iter()
                .any(|input| spent_sibling_ids.contains(&input.spending_tx_id));
            if spends_sibling {
                orphans.push(tx);
            } else {
                connected.push(tx);
            }
        }

        debug!(
            height,
            iteration,
            connected = connected.len(),
            orphans = orphans.len(),
            "intra-block resolution pass"
        );

        for tx in &connected {
            match verify_transaction(tx, height, utxo_set)? {
                TxVerification::Token(token) => {
                    if let Some(burn) = &token.burn {
                        burns.push(burn.clone());
                    }
                    token_txs.push(token);
                }
                TxVerification::NotToken => {}
            }
        }

        if orphans.is_empty() {
            break;
        }
        if connected.is_empty() {
            // Every remaining transaction references another one still in the
            // working set; no pass can make progress.
            warn!(
                height,
                remaining = orphans.len(),
                "unresolvable intra-block dependency cycle"
            );
            unresolved = orphans.iter().map(|tx| tx.tx_id.clone()).collect();
            break;
        }

        iteration += 1;
        if iteration >= max_iterations {
            warn!(
                height,
                iteration,
                remaining = orphans.len(),
                "intra-block resolution iteration bound reached"
            );
            unresolved = orphans.iter().map(|tx| tx.tx_id.clone()).collect();
            break;
        }
        working = orphans;
    }

    Ok(BlockResolution {
        height,
        token_txs,
        burns,
        unresolved,
    })
}
