//! Error taxonomy coverage: fatal invariant violations halt parsing loudly,
//! source errors abort the attempt recoverably, and malformed chain data is
//! skipped defensively without aborting the block.

use bsq_ledger::types::{RawTransaction, RawTxInput, RawTxOutput, TxoId};
use bsq_ledger::{
    BlockchainParser, ChainSourceError, LedgerConfig, LedgerError, MockChainSource,
};

fn genesis_source(value_0: u64, value_1: u64) -> MockChainSource {
    let mut source = MockChainSource::new();
    let mut genesis = RawTransaction::new("gen");
    genesis.inputs.push(RawTxInput::new("funding", 0));
    genesis.outputs.push(RawTxOutput::new(0, value_0, "g0"));
    genesis.outputs.push(RawTxOutput::new(1, value_1, "g1"));
    source.add_tx_to_block(0, genesis);
    source
}

#[test]
fn test_genesis_without_outputs_is_fatal() {
    let mut source = MockChainSource::new();
    let mut genesis = RawTransaction::new("gen");
    genesis.inputs.push(RawTxInput::new("funding", 0));
    source.add_tx_to_block(0, genesis);

    let mut parser = BlockchainParser::new(source, LedgerConfig::new("gen", 0));
    assert!(matches!(
        parser.parse_blocks(),
        Err(LedgerError::Genesis(_))
    ));
}

#[test]
fn test_unfetchable_block_aborts_the_attempt() {
    let mut source = genesis_source(100, 200);
    source.set_head_height(1);
    source.make_block_unavailable(1);

    let mut parser = BlockchainParser::new(source, LedgerConfig::new("gen", 0));
    let result = parser.parse_blocks();
    assert!(matches!(
        result,
        Err(LedgerError::Source(ChainSourceError::BlockNotFound(1)))
    ));
    // Work done so far is kept for the retry.
    assert_eq!(parser.snapshot().total_value(), 300);
}

#[test]
fn test_malformed_outputs_are_skipped_not_fatal() {
    let mut source = genesis_source(100, 200);

    let mut tx = RawTransaction::new("tx1");
    tx.inputs.push(RawTxInput::new("gen", 0));
    // No address at all.
    let mut no_address = RawTxOutput::new(0, 30, "unused");
    no_address.addresses.clear();
    // Script missing.
    let mut no_script = RawTxOutput::new(1, 30, "a");
    no_script.script.clear();
    // A well-formed output after the malformed ones must still be evaluated.
    let good = RawTxOutput::new(2, 100, "b");
    tx.outputs = vec![no_address, no_script, good];
    source.add_tx_to_block(1, tx);

    let mut parser = BlockchainParser::new(source, LedgerConfig::new("gen", 0));
    parser.parse_blocks().unwrap();

    let set = parser.snapshot();
    assert!(!set.contains(&TxoId::new("tx1", 0)));
    assert!(!set.contains(&TxoId::new("tx1", 1)));
    assert_eq!(set.get(&TxoId::new("tx1", 2)).unwrap().value, 100);
    assert_eq!(parser.total_burned(), 0);
}

#[test]
fn test_resolution_bound_leaves_deep_chain_unresolved() {
    let mut source = genesis_source(100, 200);
    let chain = |tx_id: &str, spends: &str| {
        let mut tx = RawTransaction::new(tx_id);
        tx.inputs.push(RawTxInput::new(spends, 0));
        tx.outputs
            .push(RawTxOutput::new(0, 100, format!("addr-{tx_id}")));
        tx
    };
    source.add_tx_to_block(1, chain("a", "gen"));
    source.add_tx_to_block(1, chain("b", "a"));
    source.add_tx_to_block(1, chain("c", "b"));

    let mut config = LedgerConfig::new("gen", 0);
    config.max_resolve_iterations = 2;
    let mut parser = BlockchainParser::new(source, config);
    parser.parse_blocks().unwrap();

    let set = parser.snapshot();
    // a and b resolved; c was stranded by the bound and carries no token
    // value, so b's output stays live.
    assert!(set.is_spendable(&TxoId::new("b", 0)));
    assert!(!set.contains(&TxoId::new("c", 0)));
    // Conservation still holds: nothing was burned or created for c.
    assert_eq!(
        set.total_value() + parser.total_burned(),
        parser.issued_supply()
    );
}

#[test]
fn test_out_of_order_block_is_fatal() {
    let mut parser =
        BlockchainParser::new(genesis_source(100, 200), LedgerConfig::new("gen", 0));
    parser.parse_blocks().unwrap();

    let result = parser.parse_block_at(7);
    assert!(matches!(
        result,
        Err(LedgerError::OutOfOrderBlock {
            expected: 1,
            got: 7
        })
    ));
}
