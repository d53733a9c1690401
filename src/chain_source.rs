//! Boundary to the base-layer chain
//!
//! The engine never talks to a node directly; it consumes blocks and
//! fully-resolved transactions through [`ChainSource`]. The RPC transport
//! behind it (timeouts, retries, connection management) is an external
//! collaborator concern.

use crate::types::{Block, BlockHeight, RawTransaction, TxId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Errors raised by the chain source. All of them are recoverable from the
/// engine's point of view: the current sync attempt aborts and the caller
/// decides whether to retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainSourceError {
    #[error("block at height {0} not available")]
    BlockNotFound(BlockHeight),

    #[error("transaction {0} not available")]
    TxNotFound(TxId),

    #[error("chain source unreachable: {0}")]
    Unreachable(String),
}

/// Supplier of chain data.
///
/// Implementations must deliver transactions with inputs referencing the
/// prior outputs they spend and outputs carrying value, addresses and script,
/// as a Bitcoin-style `getrawtransaction` RPC does.
pub trait ChainSource {
    fn chain_head_height(&self) -> Result<BlockHeight, ChainSourceError>;

    fn block(&self, height: BlockHeight) -> Result<Block, ChainSourceError>;

    fn transaction(&self, tx_id: &str) -> Result<RawTransaction, ChainSourceError>;
}

/// In-memory chain source for tests and local experiments.
///
/// Blocks are assembled by adding transactions at a height; the chain head is
/// moved explicitly so a test can grow the chain between sync attempts.
#[derive(Debug, Default, Clone)]
pub struct MockChainSource {
    head_height: BlockHeight,
    txs_by_id: HashMap<TxId, RawTransaction>,
    tx_ids_by_height: BTreeMap<BlockHeight, Vec<TxId>>,
    unavailable: HashSet<BlockHeight>,
}

impl MockChainSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transaction in the block at the given height. Transactions
    /// keep the insertion order inside their block.
    pub fn add_tx_to_block(&mut self, height: BlockHeight, tx: RawTransaction) {
        self.tx_ids_by_height
            .entry(height)
            .or_default()
            .push(tx.tx_id.clone());
        self.txs_by_id.insert(tx.tx_id.clone(), tx);
        if height > self.head_height {
            self.head_height = height;
        }
    }

    pub fn set_head_height(&mut self, height: BlockHeight) {
        self.head_height = height;
    }

    /// Make a block temporarily unavailable so a fetch for it fails,
    /// simulating an unreachable or lagging node.
    pub fn make_block_unavailable(&mut self, height: BlockHeight) {
        self.unavailable.insert(height);
    }

    pub fn make_block_available(&mut self, height: BlockHeight) {
        self.unavailable.remove(&height);
    }
}

impl ChainSource for MockChainSource {
    fn chain_head_height(&self) -> Result<BlockHeight, ChainSourceError> {
        Ok(self.head_height)
    }

    fn block(&self, height: BlockHeight) -> Result<Block, ChainSourceError> {
        if height > self.head_height || self.unavailable.contains(&height) {
            return Err(ChainSourceError::BlockNotFound(height));
        }
        // Heights without registered transactions are valid empty blocks.
        Ok(Block {
            height,
            tx_ids: self
                .tx_ids_by_height
                .get(&height)
                .cloned()
                .unwrap_or_default(),
        })
    }

    fn transaction(&self, tx_id: &str) -> Result<RawTransaction, ChainSourceError> {
        self.txs_by_id
            .get(tx_id)
            .cloned()
            .ok_or_else(|| ChainSourceError::TxNotFound(tx_id.to_string()))
    }
}

/// Clonable, thread-safe handle onto a [`MockChainSource`], so a test can
/// keep growing the chain after a parser took ownership of the source.
#[derive(Debug, Clone, Default)]
pub struct SharedMockChainSource {
    inner: Arc<Mutex<MockChainSource>>,
}

impl SharedMockChainSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockChainSource> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_tx_to_block(&self, height: BlockHeight, tx: RawTransaction) {
        self.lock().add_tx_to_block(height, tx);
    }

    pub fn set_head_height(&self, height: BlockHeight) {
        self.lock().set_head_height(height);
    }

    pub fn make_block_unavailable(&self, height: BlockHeight) {
        self.lock().make_block_unavailable(height);
    }

    pub fn make_block_available(&self, height: BlockHeight) {
        self.lock().make_block_available(height);
    }
}

impl ChainSource for SharedMockChainSource {
    fn chain_head_height(&self) -> Result<BlockHeight, ChainSourceError> {
        self.lock().chain_head_height()
    }

    fn block(&self, height: BlockHeight) -> Result<Block, ChainSourceError> {
        self.lock().block(height)
    }

    fn transaction(&self, tx_id: &str) -> Result<RawTransaction, ChainSourceError> {
        self.lock().transaction(tx_id)
    }
}
