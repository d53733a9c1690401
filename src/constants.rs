//! Protocol constants for the BSQ ledger engine

use crate::types::BlockHeight;

/// Upper bound on intra-block orphan resolution passes.
///
/// Worst case is a block where every transaction spends a sibling, so only
/// one transaction resolves per pass. Real chains stay far below this bound;
/// transactions still unresolved when it is hit carry no token value for
/// that block.
pub const MAX_RESOLVE_ITERATIONS: u32 = 100;

/// Mainnet genesis transaction id (2017-06-26).
pub const BTC_GENESIS_TX_ID: &str =
    "4371a1579bccc672231178cc5fe9fbb9366774d3bcbf21545a82f637f4b61a06";

/// Mainnet genesis block height.
pub const BTC_GENESIS_BLOCK_HEIGHT: BlockHeight = 473_000;

/// Regtest genesis transaction id.
pub const BTC_REG_TEST_GENESIS_TX_ID: &str =
    "389d631bb48bd2f74fcc88c3506e2b03114b18b4e396c3bd2b8bb7d7ff9ee0d6";

/// Regtest genesis block height.
pub const BTC_REG_TEST_GENESIS_BLOCK_HEIGHT: BlockHeight = 1441;
