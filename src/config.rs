//! Engine configuration

use crate::constants::*;
use crate::types::{BlockHeight, TxId};
use serde::{Deserialize, Serialize};

/// Configuration constants supplied by the caller at construction.
///
/// The genesis transaction id and height pin the start of the token ledger;
/// every node of a network must use the same values to reach the same state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub genesis_tx_id: TxId,
    pub genesis_block_height: BlockHeight,
    /// Bound on intra-block orphan resolution passes.
    pub max_resolve_iterations: u32,
}

impl LedgerConfig {
    pub fn new(genesis_tx_id: impl Into<TxId>, genesis_block_height: BlockHeight) -> Self {
        Self {
            genesis_tx_id: genesis_tx_id.into(),
            genesis_block_height,
            max_resolve_iterations: MAX_RESOLVE_ITERATIONS,
        }
    }

    /// Mainnet genesis configuration.
    pub fn mainnet() -> Self {
        Self::new(BTC_GENESIS_TX_ID, BTC_GENESIS_BLOCK_HEIGHT)
    }

    /// Regtest genesis configuration.
    pub fn regtest() -> Self {
        Self::new(BTC_REG_TEST_GENESIS_TX_ID, BTC_REG_TEST_GENESIS_BLOCK_HEIGHT)
    }
}
