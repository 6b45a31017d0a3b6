//! Reconciles indexer listings with per-output status answers.

use serde::Serialize;

use crate::indexer::{IndexerUtxo, UtxoStatus};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoWithStatus {
    #[serde(flatten)]
    pub utxo: IndexerUtxo,
    /// `None` when the status was never fetched or the fetch failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UtxoStatus>,
}

impl UtxoWithStatus {
    pub fn new(utxo: IndexerUtxo) -> Self {
        Self { utxo, status: None }
    }

    pub fn is_spent(&self) -> bool {
        self.status.as_ref().is_some_and(|status| status.is_spent)
    }

    /// Market-locked, or holding an inscription or rune that a plain send would burn.
    pub fn is_locked(&self) -> bool {
        self.utxo.listed_locked
            || self.utxo.carries_assets()
            || self.status.as_ref().is_some_and(|status| status.is_locked)
    }
}

impl From<IndexerUtxo> for UtxoWithStatus {
    fn from(utxo: IndexerUtxo) -> Self {
        Self::new(utxo)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UtxoBuckets {
    pub spendable: Vec<UtxoWithStatus>,
    pub locked: Vec<UtxoWithStatus>,
    pub spent: Vec<UtxoWithStatus>,
}

impl UtxoBuckets {
    pub fn spendable_total(&self) -> u64 {
        total(&self.spendable)
    }

    pub fn locked_total(&self) -> u64 {
        total(&self.locked)
    }

    pub fn spent_total(&self) -> u64 {
        total(&self.spent)
    }
}

fn total(utxos: &[UtxoWithStatus]) -> u64 {
    utxos
        .iter()
        .fold(0u64, |sum, utxo| sum.saturating_add(utxo.utxo.satoshi))
}

/// Splits `utxos` into spendable, locked and spent, preserving order within each bucket.
///
/// Spent wins over locked; anything neither spent nor locked is spendable.
pub fn partition(utxos: Vec<UtxoWithStatus>) -> UtxoBuckets {
    let mut buckets = UtxoBuckets::default();

    for utxo in utxos {
        if utxo.is_spent() {
            buckets.spent.push(utxo);
        } else if utxo.is_locked() {
            buckets.locked.push(utxo);
        } else {
            buckets.spendable.push(utxo);
        }
    }

    buckets
}
