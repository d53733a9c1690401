//! # bsq-ledger
//!
//! Deterministic colored-coin ledger engine. Derives the supply and ownership
//! of the BSQ token from an external base-layer blockchain by walking blocks
//! from a fixed genesis height and reconstructing which transaction outputs
//! legitimately carry token value.
//!
//! ## Architecture
//!
//! The engine is a single pipeline over an explicit, injectable ledger state:
//! - [`ChainSource`] — I/O boundary delivering blocks and raw transactions
//! - [`UtxoSet`] — the authoritative set of live token-carrying outputs
//! - [`genesis`] — one-shot seeding from the genesis transaction
//! - [`resolver`] — intra-block dependency resolution (sibling spends)
//! - [`verifier`] — per-transaction value redistribution and burning
//! - [`BlockchainParser`] — orchestration from genesis to chain head
//! - [`LedgerService`] — lifecycle: background bulk sync and follow mode
//!
//! ## Design Principles
//!
//! 1. **Determinism**: identical chain data yields byte-identical state on
//!    every node; ordered maps and a SHA-256 state digest make divergence
//!    detectable.
//! 2. **Conservation**: live value plus cumulative burns always equals the
//!    genesis issuance; value is never created after genesis.
//! 3. **Single writer**: blocks are applied strictly in height order by one
//!    pipeline; readers take consistent snapshots.
//! 4. **Burns are values**: leftover input value is reported as structured
//!    events, not log lines.
//!
//! ## Usage
//!
//! ```rust
//! use bsq_ledger::{BlockchainParser, LedgerConfig, MockChainSource};
//! use bsq_ledger::types::{RawTransaction, RawTxInput, RawTxOutput};
//!
//! let mut source = MockChainSource::new();
//! let mut genesis = RawTransaction::new("gen-tx");
//! genesis.inputs.push(RawTxInput::new("funding-tx", 0));
//! genesis.outputs.push(RawTxOutput::new(0, 10_000, "founder"));
//! source.add_tx_to_block(0, genesis);
//!
//! let mut parser = BlockchainParser::new(source, LedgerConfig::new("gen-tx", 0));
//! let report = parser.parse_blocks().unwrap();
//! assert_eq!(report.blocks_parsed, 1);
//! assert_eq!(parser.issued_supply(), 10_000);
//! assert_eq!(parser.snapshot().total_value(), 10_000);
//! ```

pub mod chain_source;
pub mod config;
pub mod constants;
pub mod error;
pub mod genesis;
pub mod parser;
pub mod resolver;
pub mod service;
pub mod types;
pub mod utxo_set;
pub mod verifier;

// Re-export commonly used items
pub use chain_source::{ChainSource, ChainSourceError, MockChainSource, SharedMockChainSource};
pub use config::LedgerConfig;
pub use constants::*;
pub use error::{LedgerError, Result};
pub use parser::{BlockResult, BlockchainParser, Ledger, LedgerView, ParserState, SyncReport};
pub use resolver::{resolve_block, BlockResolution};
pub use service::LedgerService;
pub use types::{Amount, BlockHeight, TxId, TxoId, Utxo};
pub use utxo_set::UtxoSet;
pub use verifier::{verify_transaction, BurnEvent, BurnReason, TokenTx, TxVerification};
