//! Verification of a single connected transaction
//!
//! A transaction carries token value exactly when at least one of its inputs
//! matches a live UTXO. Matched inputs are consumed and their value is
//! redistributed over the outputs in index order; whatever is not
//! redistributed is burned.

use crate::error::{LedgerError, Result};
use crate::types::{Amount, BlockHeight, RawTransaction, TxId, TxoId, Utxo};
use crate::utxo_set::UtxoSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Why token value was burned by a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurnReason {
    /// The outputs summed to less than the inputs supplied.
    LeftoverInputValue,
    /// An output exceeded the remaining input value, stopping output
    /// evaluation for the rest of the transaction.
    OutputsExceedInputs,
}

/// Token value irrecoverably removed from supply by one transaction.
///
/// Burns are expected protocol outcomes (trade fees are paid this way), not
/// errors. They are returned as values so auditors can assert on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnEvent {
    pub tx_id: TxId,
    pub block_height: BlockHeight,
    pub amount: Amount,
    pub reason: BurnReason,
}

/// Outcome of verifying a transaction that did carry token value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTx {
    pub tx_id: TxId,
    /// UTXOs consumed by this transaction's inputs.
    pub consumed: Vec<Utxo>,
    /// Keys of the UTXOs created for this transaction's outputs.
    pub created: Vec<TxoId>,
    pub burn: Option<BurnEvent>,
}

/// Outcome of verifying one connected transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxVerification {
    /// The transaction spent token value; the UTXO set was updated.
    Token(TokenTx),
    /// No input matched a live UTXO; the transaction is base-layer only and
    /// the UTXO set is unchanged.
    NotToken,
}

/// Verify one connected transaction against the ledger.
///
/// 1. Every input that matches a live UTXO consumes it; unmatched inputs are
///    ordinary base-layer inputs and are ignored.
/// 2. If no input matched, the transaction carries no token value.
/// 3. Outputs are walked in ascending index order. A single-address output
///    whose value fits into the remaining input value becomes a new UTXO.
///    The first output that would overdraw the remainder stops the walk for
///    good; later outputs are never evaluated, even if individually
///    affordable. Outputs with zero value, no address, multiple addresses or
///    a missing script are skipped without stopping the walk.
/// 4. Any remaining input value is burned and reported.
pub fn verify_transaction(
    tx: &RawTransaction,
    block_height: BlockHeight,
    utxo_set: &mut UtxoSet,
) -> Result<TxVerification> {
    let mut available_value: Amount = 0;
    let mut consumed = Vec::new();
    for input in &tx.inputs {
        if let Some(spent) = utxo_set.remove(&input.spent_txo_id()) {
            available_value += spent.value;
            consumed.push(spent);
        }
    }

    if available_value == 0 {
        debug!(tx_id = %tx.tx_id, "no token value in inputs");
        return Ok(TxVerification::NotToken);
    }

    // A transaction's outputs are resolved at most once.
    if utxo_set.contains_tx(&tx.tx_id) {
        return Err(LedgerError::TxAlreadyResolved(tx.tx_id.clone()));
    }

    let mut outputs: Vec<_> = tx.outputs.iter().collect();
    outputs.sort_by_key(|o| o.index);

    let mut created = Vec::new();
    let mut stopped_early = false;
    for output in outputs {
        let Some(address) = output.single_address() else {
            continue;
        };
        if output.value == 0 {
            continue;
        }
        if output.value > available_value {
            // Order-sensitive by protocol: later outputs are not evaluated.
            stopped_early = true;
            break;
        }
        utxo_set.insert(Utxo {
            tx_id: tx.tx_id.clone(),
            index: output.index,
            value: output.value,
            block_height,
            is_coinbase: tx.is_coinbase(),
            script: output.script.clone(),
            address: address.clone(),
        })?;
        available_value -= output.value;
        created.push(TxoId::new(tx.tx_id.clone(), output.index));
    }

    let burn = if available_value > 0 {
        let reason = if stopped_early {
            BurnReason::OutputsExceedInputs
        } else {
            BurnReason::LeftoverInputValue
        };
        info!(
            tx_id = %tx.tx_id,
            amount = available_value,
            ?reason,
            "token value burned"
        );
        Some(BurnEvent {
            tx_id: tx.tx_id.clone(),
            block_height,
            amount: available_value,
            reason,
        })
    } else {
        None
    };

    Ok(TxVerification::Token(TokenTx {
        tx_id: tx.tx_id.clone(),
        consumed,
        created,
        burn,
    }))
}
