//! Lifecycle control surface around the parsing pipeline
//!
//! `LedgerService` runs the single writer on a background thread: bulk sync
//! from genesis to the chain head first, then incremental follow mode driven
//! by new-block announcements. Readers hold a [`LedgerView`] and are never
//! blocked for longer than one block's application.

use crate::chain_source::ChainSource;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::parser::{BlockchainParser, LedgerView, SyncReport};
use crate::types::BlockHeight;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use tracing::info;

type WorkerResult<C> = (BlockchainParser<C>, Result<SyncReport>);

/// Owns the parser and its worker thread.
pub struct LedgerService<C: ChainSource + Send + 'static> {
    parser: Option<BlockchainParser<C>>,
    worker: Option<JoinHandle<WorkerResult<C>>>,
    cancel: Arc<AtomicBool>,
    view: LedgerView,
    block_tx: Option<Sender<BlockHeight>>,
}

impl<C: ChainSource + Send + 'static> LedgerService<C> {
    pub fn new(source: C, config: LedgerConfig) -> Self {
        let parser = BlockchainParser::new(source, config);
        let cancel = parser.cancel_flag();
        let view = parser.view();
        Self {
            parser: Some(parser),
            worker: None,
            cancel,
            view,
            block_tx: None,
        }
    }

    /// Read-only handle for wallet/UI/governance callers. Remains valid
    /// across start/stop cycles.
    pub fn view(&self) -> LedgerView {
        self.view.clone()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawn the writer thread: bulk sync, then follow mode until stopped.
    pub fn start_bulk_sync(&mut self) -> Result<()> {
        let Some(mut parser) = self.parser.take() else {
            return Err(LedgerError::Worker("sync already running".to_string()));
        };
        self.cancel.store(false, Ordering::Relaxed);
        let (block_tx, block_rx) = mpsc::channel();
        self.block_tx = Some(block_tx);
        self.worker = Some(std::thread::spawn(move || {
            let outcome = run_sync(&mut parser, &block_rx);
            (parser, outcome)
        }));
        Ok(())
    }

    /// Announce a newly mined block for follow mode. Announcements must
    /// arrive in height order; heights bulk sync already applied are ignored,
    /// as are announcements before `start_bulk_sync`.
    pub fn announce_block(&self, height: BlockHeight) {
        if let Some(block_tx) = &self.block_tx {
            let _ = block_tx.send(height);
        }
    }

    /// Ask the worker to stop between blocks. Bulk sync then returns after
    /// the block in progress instead of running to the chain head; the block
    /// being applied is never interrupted. Follow `request_cancel` with
    /// [`stop`](Self::stop) to join the worker.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Stop the worker gracefully and return the sync outcome.
    ///
    /// Closing the announcement channel ends follow mode once queued
    /// announcements are drained; a bulk sync still in progress runs to the
    /// chain head first unless [`request_cancel`](Self::request_cancel) was
    /// called. The parser is kept, so a later `start_bulk_sync` resumes from
    /// the first unapplied height (this is the retry path for recoverable
    /// source errors as well).
    pub fn stop(&mut self) -> Option<Result<SyncReport>> {
        self.block_tx = None;
        let handle = self.worker.take()?;
        match handle.join() {
            Ok((parser, outcome)) => {
                self.parser = Some(parser);
                Some(outcome)
            }
            Err(_) => Some(Err(LedgerError::Worker(
                "sync worker panicked".to_string(),
            ))),
        }
    }
}

impl<C: ChainSource + Send + 'static> Drop for LedgerService<C> {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.block_tx = None;
    }
}

/// Worker body: bulk sync, then drain new-block announcements in order.
fn run_sync<C: ChainSource>(
    parser: &mut BlockchainParser<C>,
    block_rx: &Receiver<BlockHeight>,
) -> Result<SyncReport> {
    let report = parser.parse_blocks()?;
    info!("bulk sync finished, following new blocks");
    // Follow mode ends when the announcement channel closes. Announcements
    // already queued at shutdown are still applied: a block is applied fully
    // or not at all.
    while let Ok(height) = block_rx.recv() {
        // Bulk sync may have raced ahead of the announcer; a height it
        // already applied is stale, not an ordering violation.
        if height < parser.next_height() {
            continue;
        }
        parser.parse_block_at(height)?;
    }
    Ok(report)
}
