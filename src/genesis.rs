//! Genesis resolution: seeding the ledger from the designated genesis
//! transaction
//!
//! Runs exactly once, before any other block is parsed. Every single-address
//! output of the genesis transaction unconditionally becomes a live UTXO;
//! their sum is the total token supply ever issued.

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::types::{Amount, RawTransaction, Utxo};
use crate::utxo_set::UtxoSet;
use tracing::info;

/// Seed the UTXO set from the genesis transaction, returning the issued
/// supply.
///
/// Outputs with zero or more than one address are skipped entirely: the token
/// protocol does not support multi-address outputs. Fatal if no eligible
/// output exists or if the set already holds records for the genesis
/// transaction id.
pub fn apply_genesis(
    tx: &RawTransaction,
    config: &LedgerConfig,
    utxo_set: &mut UtxoSet,
) -> Result<Amount> {
    if tx.tx_id != config.genesis_tx_id {
        return Err(LedgerError::Genesis(format!(
            "expected genesis transaction {}, got {}",
            config.genesis_tx_id, tx.tx_id
        )));
    }
    if utxo_set.contains_tx(&tx.tx_id) {
        return Err(LedgerError::Genesis(
            "genesis transaction already applied".to_string(),
        ));
    }

    let mut issued: Amount = 0;
    let mut created = 0usize;
    for output in &tx.outputs {
        let Some(address) = output.single_address() else {
            continue;
        };
        utxo_set.insert(Utxo {
            tx_id: tx.tx_id.clone(),
            index: output.index,
            value: output.value,
            block_height: config.genesis_block_height,
            is_coinbase: tx.is_coinbase(),
            script: output.script.clone(),
            address: address.clone(),
        })?;
        issued += output.value;
        created += 1;
    }

    if created == 0 {
        return Err(LedgerError::Genesis(
            "genesis transaction has no single-address outputs".to_string(),
        ));
    }

    info!(
        genesis_tx_id = %tx.tx_id,
        height = config.genesis_block_height,
        outputs = created,
        issued,
        "genesis applied"
    );
    Ok(issued)
}
