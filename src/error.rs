//! Error types for ledger parsing

use crate::chain_source::ChainSourceError;
use crate::types::{BlockHeight, TxId, TxoId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// The chain source could not deliver a block or transaction. Recoverable:
    /// the current sync attempt aborts and the caller decides retry policy.
    #[error("chain source request failed: {0}")]
    Source(#[from] ChainSourceError),

    /// A second live UTXO record was attempted for the same `(txId, index)`
    /// slot. Fatal: corrupted chain data or an engine defect.
    #[error("duplicate UTXO record for {0}")]
    DuplicateUtxo(TxoId),

    /// A transaction whose outputs were already resolved was verified again.
    /// Fatal: outputs are resolved at most once.
    #[error("outputs of transaction {0} already resolved")]
    TxAlreadyResolved(TxId),

    /// Genesis resolution failed. Fatal: no token supply can be issued.
    #[error("genesis resolution failed: {0}")]
    Genesis(String),

    /// Blocks must be applied strictly in increasing height order.
    #[error("out-of-order block: expected height {expected}, got {got}")]
    OutOfOrderBlock {
        expected: BlockHeight,
        got: BlockHeight,
    },

    /// The background sync worker terminated abnormally.
    #[error("sync worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
