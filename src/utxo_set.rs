//! The ledger: the authoritative set of live token-carrying outputs
//!
//! `UtxoSet` maps `txId -> outputIndex -> Utxo`. It is the only state carried
//! across block heights; everything else in the engine is a pure function of
//! `(current set, next block)`. Ordered maps keep iteration, serialization
//! and the state digest deterministic across nodes.

use crate::error::{LedgerError, Result};
use crate::types::{Amount, TxId, TxoId, Utxo};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoSet {
    by_tx: BTreeMap<TxId, BTreeMap<u32, Utxo>>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &TxoId) -> Option<&Utxo> {
        self.by_tx.get(&id.tx_id).and_then(|m| m.get(&id.index))
    }

    pub fn contains(&self, id: &TxoId) -> bool {
        self.get(id).is_some()
    }

    /// True if any live record exists under the given transaction id.
    pub fn contains_tx(&self, tx_id: &str) -> bool {
        self.by_tx.contains_key(tx_id)
    }

    /// Record a new live UTXO.
    ///
    /// Fails with [`LedgerError::DuplicateUtxo`] if the `(txId, index)` slot
    /// is already live; that is an invariant violation, never a normal
    /// protocol outcome.
    pub fn insert(&mut self, utxo: Utxo) -> Result<()> {
        let outputs = self.by_tx.entry(utxo.tx_id.clone()).or_default();
        if outputs.contains_key(&utxo.index) {
            return Err(LedgerError::DuplicateUtxo(utxo.txo_id()));
        }
        outputs.insert(utxo.index, utxo);
        Ok(())
    }

    /// Consume a live UTXO, returning it. Empty per-transaction entries are
    /// pruned so `contains_tx` reflects live records only.
    pub fn remove(&mut self, id: &TxoId) -> Option<Utxo> {
        let outputs = self.by_tx.get_mut(&id.tx_id)?;
        let removed = outputs.remove(&id.index);
        if outputs.is_empty() {
            self.by_tx.remove(&id.tx_id);
        }
        removed
    }

    pub fn is_spendable(&self, id: &TxoId) -> bool {
        self.contains(id)
    }

    pub fn utxos_for_address(&self, address: &str) -> Vec<&Utxo> {
        self.iter().filter(|u| u.address == address).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Utxo> {
        self.by_tx.values().flat_map(|m| m.values())
    }

    pub fn len(&self) -> usize {
        self.by_tx.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tx.is_empty()
    }

    /// Total token value currently live. Together with the cumulative burn
    /// amount this must always equal the genesis issuance.
    pub fn total_value(&self) -> Amount {
        self.iter().map(|u| u.value).sum()
    }

    /// SHA-256 digest over the canonical encoding of all live records.
    ///
    /// Nodes exchange this digest to detect state divergence: identical chain
    /// data must produce identical digests on every node.
    pub fn state_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for utxo in self.iter() {
            hasher.update(utxo.tx_id.as_bytes());
            hasher.update([0u8]);
            hasher.update(utxo.index.to_be_bytes());
            hasher.update(utxo.value.to_be_bytes());
            hasher.update(utxo.block_height.to_be_bytes());
            hasher.update([u8::from(utxo.is_coinbase)]);
            hasher.update(utxo.address.as_bytes());
            hasher.update([0u8]);
            hasher.update(utxo.script.as_bytes());
            hasher.update([0u8]);
        }
        hasher.finalize().into()
    }

    /// Export the set as JSON, in deterministic key order. Intended for
    /// audits and external tooling; the persisted snapshot format proper is
    /// owned by the storage layer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
