//! Block parsing orchestration
//!
//! `BlockchainParser` walks block heights from genesis to the chain head,
//! fetching each block's transactions from the chain source and applying them
//! to the ledger: genesis resolution exactly once at the genesis height, then
//! intra-block dependency resolution per block. Blocks are applied strictly
//! in increasing height order; each block's resolution depends on the
//! cumulative effect of all prior blocks.
//!
//! Fetching is plain I/O and happens outside the ledger lock; applying a
//! fetched block holds the write lock for the duration of that one block, so
//! readers always observe the state as of the last fully-applied block.

use crate::chain_source::ChainSource;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::genesis::apply_genesis;
use crate::resolver::resolve_block;
use crate::types::{Amount, BlockHeight, TxId, TxoId, Utxo};
use crate::utxo_set::UtxoSet;
use crate::verifier::BurnEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info};

/// Ledger state shared between the single writer and any readers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    pub utxos: UtxoSet,
    /// All burns observed since genesis, in application order.
    pub burns: Vec<BurnEvent>,
    /// Total supply issued by the genesis transaction; zero before genesis.
    pub issued_supply: Amount,
    pub token_tx_count: u64,
}

/// Bulk sync progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    AwaitingChainHead,
    IteratingBlocks(BlockHeight),
    Done,
}

/// Outcome of applying one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockResult {
    pub height: BlockHeight,
    pub token_tx_count: usize,
    pub burned: Amount,
    pub unresolved: Vec<TxId>,
}

/// Outcome of one bulk sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub head_height: BlockHeight,
    pub blocks_parsed: u64,
    pub token_tx_count: u64,
    pub total_burned: Amount,
}

/// Read-only handle onto the shared ledger state.
///
/// Cheap to clone; reads see the state as of the last fully-applied block
/// (the writer holds the lock per block, never longer).
#[derive(Debug, Clone)]
pub struct LedgerView {
    shared: Arc<RwLock<Ledger>>,
}

impl LedgerView {
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Ledger> {
        // A poisoned lock means the writer panicked; serve the last state
        // rather than propagate the panic into readers.
        self.shared.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consistent copy of the current UTXO set.
    pub fn snapshot(&self) -> UtxoSet {
        self.read().utxos.clone()
    }

    pub fn utxos_for_address(&self, address: &str) -> Vec<Utxo> {
        self.read()
            .utxos
            .utxos_for_address(address)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn is_spendable(&self, id: &TxoId) -> bool {
        self.read().utxos.is_spendable(id)
    }

    pub fn total_burned(&self) -> Amount {
        self.read().burns.iter().map(|b| b.amount).sum()
    }

    pub fn burns(&self) -> Vec<BurnEvent> {
        self.read().burns.clone()
    }

    pub fn issued_supply(&self) -> Amount {
        self.read().issued_supply
    }

    pub fn token_tx_count(&self) -> u64 {
        self.read().token_tx_count
    }

    pub fn state_digest(&self) -> [u8; 32] {
        self.read().utxos.state_digest()
    }
}

/// The parsing pipeline: single writer over the shared ledger.
pub struct BlockchainParser<C: ChainSource> {
    source: C,
    config: LedgerConfig,
    shared: Arc<RwLock<Ledger>>,
    cancel: Arc<AtomicBool>,
    state: ParserState,
    next_height: BlockHeight,
}

impl<C: ChainSource> BlockchainParser<C> {
    pub fn new(source: C, config: LedgerConfig) -> Self {
        let next_height = config.genesis_block_height;
        Self {
            source,
            config,
            shared: Arc::new(RwLock::new(Ledger::default())),
            cancel: Arc::new(AtomicBool::new(false)),
            state: ParserState::AwaitingChainHead,
            next_height,
        }
    }

    /// Bulk sync: query the chain head and apply every block from the first
    /// unapplied height up to and including the head.
    ///
    /// On a source error the attempt aborts with the blocks applied so far
    /// kept; calling again resumes from the first unapplied height, so the
    /// caller owns retry and backoff policy. Cancellation (see
    /// [`cancel_flag`](Self::cancel_flag)) is honored between blocks, never
    /// mid-block.
    pub fn parse_blocks(&mut self) -> Result<SyncReport> {
        self.state = ParserState::AwaitingChainHead;
        let head_height = self.source.chain_head_height()?;
        info!(
            head_height,
            start_height = self.next_height,
            "starting bulk sync"
        );

        let mut report = SyncReport {
            head_height,
            blocks_parsed: 0,
            token_tx_count: 0,
            total_burned: 0,
        };
        while self.next_height <= head_height {
            if self.is_cancelled() {
                info!(height = self.next_height, "bulk sync cancelled");
                return Ok(report);
            }
            let height = self.next_height;
            self.state = ParserState::IteratingBlocks(height);
            let result = self.parse_block_at(height)?;
            report.blocks_parsed += 1;
            report.token_tx_count += result.token_tx_count as u64;
            report.total_burned += result.burned;
        }

        self.state = ParserState::Done;
        info!(
            head_height,
            blocks_parsed = report.blocks_parsed,
            token_txs = report.token_tx_count,
            burned = report.total_burned,
            "bulk sync done"
        );
        Ok(report)
    }

    /// Fetch and apply the block at `height`, which must be exactly the next
    /// unapplied height. Used by bulk sync and by incremental follow mode
    /// once new-block announcements arrive.
    pub fn parse_block_at(&mut self, height: BlockHeight) -> Result<BlockResult> {
        if height != self.next_height {
            return Err(LedgerError::OutOfOrderBlock {
                expected: self.next_height,
                got: height,
            });
        }

        let fetch_started = Instant::now();
        let block = self.source.block(height)?;
        let mut txs = Vec::with_capacity(block.tx_ids.len());
        for tx_id in &block.tx_ids {
            txs.push(self.source.transaction(tx_id)?);
        }
        debug!(
            height,
            tx_count = txs.len(),
            elapsed_ms = fetch_started.elapsed().as_millis() as u64,
            "fetched block transactions"
        );

        let mut ledger = self.shared.write().unwrap_or_else(PoisonError::into_inner);
        if height == self.config.genesis_block_height {
            let position = txs
                .iter()
                .position(|tx| tx.tx_id == self.config.genesis_tx_id)
                .ok_or_else(|| {
                    LedgerError::Genesis(format!(
                        "genesis transaction {} not in block at height {}",
                        self.config.genesis_tx_id, height
                    ))
                })?;
            // Genesis outputs are issued unconditionally and must not go
            // through input matching.
            let genesis_tx = txs.remove(position);
            ledger.issued_supply = apply_genesis(&genesis_tx, &self.config, &mut ledger.utxos)?;
        }

        let resolution = resolve_block(
            &txs,
            height,
            self.config.max_resolve_iterations,
            &mut ledger.utxos,
        )?;
        let token_tx_count = resolution.token_txs.len();
        let burned: Amount = resolution.burns.iter().map(|b| b.amount).sum();
        ledger.token_tx_count += token_tx_count as u64;
        ledger.burns.extend(resolution.burns);
        drop(ledger);

        self.next_height = height + 1;
        info!(height, token_txs = token_tx_count, burned, "block applied");
        Ok(BlockResult {
            height,
            token_tx_count,
            burned,
            unresolved: resolution.unresolved,
        })
    }

    /// Read-only handle for concurrent callers (wallet, UI, governance).
    pub fn view(&self) -> LedgerView {
        LedgerView {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Flag checked between blocks; setting it makes bulk sync return after
    /// the block in progress, never leaving a block partially applied.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// The next height bulk sync or follow mode will apply.
    pub fn next_height(&self) -> BlockHeight {
        self.next_height
    }

    pub fn snapshot(&self) -> UtxoSet {
        self.view().snapshot()
    }

    pub fn utxos_for_address(&self, address: &str) -> Vec<Utxo> {
        self.view().utxos_for_address(address)
    }

    pub fn is_spendable(&self, id: &TxoId) -> bool {
        self.view().is_spendable(id)
    }

    pub fn total_burned(&self) -> Amount {
        self.view().total_burned()
    }

    pub fn burns(&self) -> Vec<BurnEvent> {
        self.view().burns()
    }

    pub fn issued_supply(&self) -> Amount {
        self.view().issued_supply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_source::{MockChainSource, SharedMockChainSource};
    use crate::types::{RawTransaction, RawTxInput, RawTxOutput};

    fn genesis_source() -> MockChainSource {
        let mut source = MockChainSource::new();
        let mut genesis = RawTransaction::new("gen");
        genesis.inputs.push(RawTxInput::new("funding", 0));
        genesis.outputs.push(RawTxOutput::new(0, 100, "g0"));
        genesis.outputs.push(RawTxOutput::new(1, 200, "g1"));
        source.add_tx_to_block(0, genesis);
        source
    }

    #[test]
    fn test_bulk_sync_from_genesis() {
        let mut parser = BlockchainParser::new(genesis_source(), LedgerConfig::new("gen", 0));
        let report = parser.parse_blocks().unwrap();

        assert_eq!(report.blocks_parsed, 1);
        assert_eq!(parser.state(), ParserState::Done);
        assert_eq!(parser.issued_supply(), 300);
        assert_eq!(parser.snapshot().total_value(), 300);
    }

    #[test]
    fn test_out_of_order_block_rejected() {
        let mut parser = BlockchainParser::new(genesis_source(), LedgerConfig::new("gen", 0));
        let result = parser.parse_block_at(5);
        assert!(matches!(
            result,
            Err(LedgerError::OutOfOrderBlock { expected: 0, got: 5 })
        ));
    }

    #[test]
    fn test_missing_genesis_tx_is_fatal() {
        let mut source = MockChainSource::new();
        let mut tx = RawTransaction::new("other");
        tx.outputs.push(RawTxOutput::new(0, 1, "a"));
        source.add_tx_to_block(0, tx);

        let mut parser = BlockchainParser::new(source, LedgerConfig::new("gen", 0));
        assert!(matches!(
            parser.parse_blocks(),
            Err(LedgerError::Genesis(_))
        ));
    }

    #[test]
    fn test_follow_mode_applies_new_block() {
        let source = SharedMockChainSource::new();
        let mut genesis = RawTransaction::new("gen");
        genesis.inputs.push(RawTxInput::new("funding", 0));
        genesis.outputs.push(RawTxOutput::new(0, 100, "g0"));
        genesis.outputs.push(RawTxOutput::new(1, 200, "g1"));
        source.add_tx_to_block(0, genesis);

        let mut parser = BlockchainParser::new(source.clone(), LedgerConfig::new("gen", 0));
        parser.parse_blocks().unwrap();
        assert_eq!(parser.state(), ParserState::Done);

        // A new block arrives after bulk sync completed.
        let mut tx = RawTransaction::new("tx1");
        tx.inputs.push(RawTxInput::new("gen", 1));
        tx.outputs.push(RawTxOutput::new(0, 150, "t1"));
        source.add_tx_to_block(1, tx);

        let result = parser.parse_block_at(1).unwrap();
        assert_eq!(result.token_tx_count, 1);
        assert_eq!(result.burned, 50);
        assert_eq!(parser.total_burned(), 50);
        assert_eq!(parser.snapshot().total_value(), 250);
    }

    #[test]
    fn test_source_error_aborts_and_resumes() {
        let source = SharedMockChainSource::new();
        let mut genesis = RawTransaction::new("gen");
        genesis.inputs.push(RawTxInput::new("funding", 0));
        genesis.outputs.push(RawTxOutput::new(0, 300, "g0"));
        source.add_tx_to_block(0, genesis);
        let mut tx = RawTransaction::new("tx1");
        tx.inputs.push(RawTxInput::new("gen", 0));
        tx.outputs.push(RawTxOutput::new(0, 300, "t1"));
        source.add_tx_to_block(2, tx);
        source.make_block_unavailable(1);

        let mut parser = BlockchainParser::new(source.clone(), LedgerConfig::new("gen", 0));
        let result = parser.parse_blocks();
        assert!(matches!(result, Err(LedgerError::Source(_))));
        // The genesis block was applied before the abort.
        assert_eq!(parser.snapshot().total_value(), 300);
        assert_eq!(parser.next_height(), 1);

        // The retried attempt resumes from the first unapplied height.
        source.make_block_available(1);
        let report = parser.parse_blocks().unwrap();
        assert_eq!(report.blocks_parsed, 2);
        assert_eq!(parser.state(), ParserState::Done);
        assert!(parser.is_spendable(&TxoId::new("tx1", 0)));
    }

    #[test]
    fn test_cancel_between_blocks() {
        let mut parser = BlockchainParser::new(genesis_source(), LedgerConfig::new("gen", 0));
        parser.cancel_flag().store(true, Ordering::Relaxed);

        let report = parser.parse_blocks().unwrap();
        assert_eq!(report.blocks_parsed, 0);
        assert!(parser.snapshot().is_empty());
    }
}
