//! The UTXO indexer: what the console asks of it and the shapes it answers with.

use async_trait::async_trait;
use console_psbt_builder::UtxoInput;
use serde::{Deserialize, Serialize};

use crate::error::IndexerError;

mod envelope;
mod http;
mod ordiscan;

pub use http::{HttpIndexer, DEFAULT_INDEXER_URL};
pub use ordiscan::{OrdiscanIndexer, DEFAULT_ORDISCAN_URL};

pub(crate) use envelope::{parse_ordiscan_response, parse_status_response, parse_utxo_response};

/// A rune amount carried by an output. The balance is kept as the indexer's decimal string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuneBalance {
    pub name: String,
    pub balance: String,
}

/// A UTXO as listed by the indexer, normalized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerUtxo {
    pub txid: String,
    pub vout: u32,
    /// `0` when the indexer omitted the value (market-locked listings do).
    pub satoshi: u64,
    pub address: String,
    /// Empty when unknown.
    pub script_pk: String,
    /// Listed by the indexer among the market-locked outputs.
    pub listed_locked: bool,
    /// Inscription ids sitting on this output.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inscriptions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub runes: Vec<RuneBalance>,
}

impl IndexerUtxo {
    /// `txid:vout`.
    pub fn outpoint(&self) -> String {
        format!("{}:{}", self.txid, self.vout)
    }

    /// Spending this output would also move an inscription or rune balance.
    pub fn carries_assets(&self) -> bool {
        !self.inscriptions.is_empty() || !self.runes.is_empty()
    }

    pub fn to_input(&self) -> UtxoInput {
        let input = UtxoInput::new(self.txid.clone(), self.vout, self.satoshi, self.address.clone());

        if self.script_pk.trim().is_empty() {
            input
        } else {
            input.with_script_pk(self.script_pk.clone())
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Unspent,
    Spent,
    Pending,
    Locked,
}

/// Spend status of one output as reported by the indexer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoStatus {
    pub txid: String,
    #[serde(deserialize_with = "crate::serde::deserialize_u32")]
    pub vout: u32,
    pub status: StatusKind,
    pub is_spent: bool,
    #[serde(default)]
    pub is_locked: bool,
}

impl UtxoStatus {
    /// Maps the availability answer of the coded envelope onto a status.
    ///
    /// A reason mentioning a market lock or auction means locked but not spent. Any other
    /// reason means pending. No reason at all means spent.
    pub fn from_availability(txid: &str, vout: u32, available: bool, reason: &str) -> Self {
        let market_locked = reason.contains("locked") || reason.contains("auction");

        let status = if available {
            StatusKind::Unspent
        } else if market_locked {
            StatusKind::Locked
        } else if !reason.is_empty() {
            StatusKind::Pending
        } else {
            StatusKind::Spent
        };

        Self {
            txid: txid.to_string(),
            vout,
            status,
            is_spent: !available && !market_locked,
            is_locked: market_locked,
        }
    }
}

#[async_trait]
pub trait IndexerApi: Send + Sync {
    /// Lists the UTXOs held by `address`, available and market-locked alike.
    async fn utxos(&self, address: &str) -> Result<Vec<IndexerUtxo>, IndexerError>;

    async fn utxo_status(
        &self,
        txid: &str,
        vout: u32,
        address: &str,
    ) -> Result<UtxoStatus, IndexerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    mod from_availability {
        use super::*;

        #[test]
        fn test_available_is_unspent() {
            let status = UtxoStatus::from_availability("aa", 0, true, "");
            assert_eq!(status.status, StatusKind::Unspent);
            assert!(!status.is_spent);
            assert!(!status.is_locked);
        }

        #[test]
        fn test_market_lock_is_not_spent() {
            for reason in ["utxo locked by listing", "in auction"] {
                let status = UtxoStatus::from_availability("aa", 0, false, reason);
                assert_eq!(status.status, StatusKind::Locked);
                assert!(!status.is_spent);
                assert!(status.is_locked);
            }
        }

        #[test]
        fn test_other_reasons_are_pending() {
            let status = UtxoStatus::from_availability("aa", 1, false, "in mempool");
            assert_eq!(status.status, StatusKind::Pending);
            assert!(status.is_spent);
        }

        #[test]
        fn test_no_reason_is_spent() {
            let status = UtxoStatus::from_availability("aa", 1, false, "");
            assert_eq!(status.status, StatusKind::Spent);
            assert!(status.is_spent);
        }
    }

    #[test]
    fn test_to_input_carries_script_only_when_known() {
        let mut utxo = IndexerUtxo {
            txid: "ab".repeat(32),
            vout: 1,
            satoshi: 1_000,
            address: "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4".to_string(),
            script_pk: String::new(),
            listed_locked: false,
            inscriptions: vec![],
            runes: vec![],
        };
        assert_eq!(utxo.to_input().script_pk, None);

        utxo.script_pk = "0014751e76e8199196d454941c45d1b3a323f1433bd6".to_string();
        let input = utxo.to_input();
        assert_eq!(input.script_pk.as_deref(), Some(utxo.script_pk.as_str()));
        assert_eq!(input.value, 1_000);
        assert_eq!(utxo.outpoint(), format!("{}:1", "ab".repeat(32)));
    }

    #[test]
    fn test_carries_assets_with_inscriptions_or_runes() {
        let mut utxo = IndexerUtxo {
            txid: "cd".repeat(32),
            vout: 0,
            satoshi: 546,
            address: "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4".to_string(),
            script_pk: String::new(),
            listed_locked: false,
            inscriptions: vec![],
            runes: vec![],
        };
        assert!(!utxo.carries_assets());

        utxo.inscriptions.push(format!("{}i0", "cd".repeat(32)));
        assert!(utxo.carries_assets());

        utxo.inscriptions.clear();
        utxo.runes.push(RuneBalance {
            name: "UNCOMMONGOODS".to_string(),
            balance: "1".to_string(),
        });
        assert!(utxo.carries_assets());
    }
}
