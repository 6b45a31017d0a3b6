use console_psbt_builder::UtxoInput;
use serde::{Deserialize, Serialize};

use crate::indexer::IndexerUtxo;

/// A UTXO the user picked for spending.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedUtxo {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_pk: Option<String>,
}

impl SelectedUtxo {
    /// `txid:vout` with the txid lower-cased, the key the selection is indexed by.
    pub fn outpoint(&self) -> String {
        outpoint_key(&self.txid, self.vout)
    }

    pub fn to_input(&self) -> UtxoInput {
        UtxoInput {
            txid: self.txid.clone(),
            vout: self.vout,
            value: self.value,
            address: self.address.clone(),
            script_pk: self.script_pk.clone(),
        }
    }
}

impl From<&IndexerUtxo> for SelectedUtxo {
    fn from(utxo: &IndexerUtxo) -> Self {
        let input = utxo.to_input();

        Self {
            txid: input.txid,
            vout: input.vout,
            value: input.value,
            address: input.address,
            script_pk: input.script_pk,
        }
    }
}

fn outpoint_key(txid: &str, vout: u32) -> String {
    format!("{}:{vout}", txid.trim().to_lowercase())
}

/// Ordered set of selected UTXOs, keyed by outpoint. Selection order is kept so the built
/// transaction spends inputs in the order the user picked them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UtxoSelection {
    selected: Vec<SelectedUtxo>,
}

impl UtxoSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `utxo` unless its outpoint is already selected. Returns whether it was added.
    pub fn add(&mut self, utxo: SelectedUtxo) -> bool {
        if self.contains(&utxo.outpoint()) {
            return false;
        }

        self.selected.push(utxo);
        true
    }

    pub fn remove(&mut self, outpoint: &str) -> Option<SelectedUtxo> {
        let key = normalize_outpoint(outpoint);
        let index = self.selected.iter().position(|utxo| utxo.outpoint() == key)?;

        Some(self.selected.remove(index))
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, outpoint: &str) -> bool {
        let key = normalize_outpoint(outpoint);
        self.selected.iter().any(|utxo| utxo.outpoint() == key)
    }

    /// Selects `utxo` if it was not selected, deselects it otherwise. Returns whether it
    /// is selected afterwards.
    pub fn toggle(&mut self, utxo: SelectedUtxo) -> bool {
        if self.remove(&utxo.outpoint()).is_some() {
            false
        } else {
            self.add(utxo)
        }
    }

    pub fn total_value(&self) -> u64 {
        self.selected
            .iter()
            .fold(0u64, |sum, utxo| sum.saturating_add(utxo.value))
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectedUtxo> {
        self.selected.iter()
    }

    pub fn to_inputs(&self) -> Vec<UtxoInput> {
        self.selected.iter().map(SelectedUtxo::to_input).collect()
    }
}

fn normalize_outpoint(outpoint: &str) -> String {
    match outpoint.trim().rsplit_once(':') {
        Some((txid, vout)) => format!("{}:{}", txid.to_lowercase(), vout),
        None => outpoint.trim().to_lowercase(),
    }
}
