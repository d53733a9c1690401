//! Core data model for the BSQ colored-coin ledger

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base-layer transaction id, as delivered by the RPC layer (hex string).
pub type TxId = String;

/// Base-layer address in its string encoding.
pub type Address = String;

/// Block height on the base chain.
pub type BlockHeight = u64;

/// Token amount in the smallest token unit.
pub type Amount = u64;

/// Key of one transaction output: `(txId, outputIndex)`.
///
/// At most one live UTXO record exists per `TxoId` at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxoId {
    pub tx_id: TxId,
    pub index: u32,
}

impl TxoId {
    pub fn new(tx_id: impl Into<TxId>, index: u32) -> Self {
        Self {
            tx_id: tx_id.into(),
            index,
        }
    }
}

impl fmt::Display for TxoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.index)
    }
}

/// An unspent transaction output currently recognized as carrying token value.
///
/// Created only by genesis resolution or transaction verification; removed
/// only when consumed as a matched input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub tx_id: TxId,
    pub index: u32,
    pub value: Amount,
    pub block_height: BlockHeight,
    pub is_coinbase: bool,
    pub script: String,
    pub address: Address,
}

impl Utxo {
    pub fn txo_id(&self) -> TxoId {
        TxoId::new(self.tx_id.clone(), self.index)
    }
}

/// One input of a raw base-layer transaction: a reference to the output it
/// spends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTxInput {
    pub spending_tx_id: TxId,
    pub spending_output_index: u32,
}

impl RawTxInput {
    pub fn new(spending_tx_id: impl Into<TxId>, spending_output_index: u32) -> Self {
        Self {
            spending_tx_id: spending_tx_id.into(),
            spending_output_index,
        }
    }

    /// Key of the output this input spends.
    pub fn spent_txo_id(&self) -> TxoId {
        TxoId::new(self.spending_tx_id.clone(), self.spending_output_index)
    }
}

/// One output of a raw base-layer transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTxOutput {
    pub index: u32,
    pub value: Amount,
    pub addresses: Vec<Address>,
    pub script: String,
}

impl RawTxOutput {
    pub fn new(index: u32, value: Amount, address: impl Into<Address>) -> Self {
        Self {
            index,
            value,
            addresses: vec![address.into()],
            script: "scriptPubKey".to_string(),
        }
    }

    /// The single address of this output, if it is eligible to carry token
    /// value.
    ///
    /// Outputs with zero or more than one address (raw multisig) are not
    /// supported by the token protocol; outputs with a missing script are
    /// malformed chain data. Both return `None` and are skipped by callers.
    pub fn single_address(&self) -> Option<&Address> {
        if self.script.is_empty() {
            return None;
        }
        match self.addresses.as_slice() {
            [address] => Some(address),
            _ => None,
        }
    }
}

/// A fully-resolved base-layer transaction as fetched from the chain source.
///
/// Immutable once fetched; owned exclusively by the parsing pass that
/// fetched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub tx_id: TxId,
    pub inputs: Vec<RawTxInput>,
    pub outputs: Vec<RawTxOutput>,
}

impl RawTransaction {
    pub fn new(tx_id: impl Into<TxId>) -> Self {
        Self {
            tx_id: tx_id.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Base-layer coinbase transactions have no inputs.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// A block as announced by the chain source: height plus the ordered list of
/// transaction ids it contains. Transactions are fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: BlockHeight,
    pub tx_ids: Vec<TxId>,
}
