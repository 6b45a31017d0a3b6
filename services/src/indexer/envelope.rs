//! The response envelopes the indexer is known to use, decoded as tagged unions.
//!
//! Shapes are tried in a fixed order. A response matching none of them is an error,
//! never an empty list.

use serde::Deserialize;
use serde_json::Value;

use super::{IndexerUtxo, RuneBalance, StatusKind, UtxoStatus};
use crate::error::IndexerError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUtxo {
    #[serde(default, alias = "txId")]
    txid: String,
    #[serde(default, alias = "vOut", deserialize_with = "crate::serde::deserialize_u32")]
    vout: u32,
    #[serde(default, alias = "value", deserialize_with = "crate::serde::deserialize_u64")]
    satoshi: u64,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    script_pk: Option<String>,
}

impl RawUtxo {
    fn normalize(self, queried_address: &str, listed_locked: bool) -> IndexerUtxo {
        let address = self
            .address
            .filter(|address| !address.trim().is_empty())
            .unwrap_or_else(|| queried_address.to_string());

        IndexerUtxo {
            txid: self.txid,
            vout: self.vout,
            satoshi: self.satoshi,
            address,
            script_pk: self.script_pk.unwrap_or_default(),
            listed_locked,
            inscriptions: vec![],
            runes: vec![],
        }
    }
}

/// One entry of an ordinals-aware listing, keyed by `txid:vout`.
#[derive(Debug, Deserialize)]
struct OrdiscanUtxo {
    outpoint: String,
    #[serde(default, deserialize_with = "crate::serde::deserialize_u64")]
    value: u64,
    #[serde(default)]
    runes: Vec<RuneBalance>,
    #[serde(default)]
    inscriptions: Vec<String>,
}

impl OrdiscanUtxo {
    fn normalize(self, queried_address: &str) -> Result<IndexerUtxo, IndexerError> {
        let (txid, vout) = match self.outpoint.split_once(':') {
            Some((txid, vout)) => (txid, vout),
            None => (self.outpoint.as_str(), "0"),
        };
        let vout = vout
            .trim()
            .parse::<u32>()
            .map_err(|_| IndexerError::InvalidJson(format!("invalid outpoint {}", self.outpoint)))?;

        Ok(IndexerUtxo {
            txid: txid.to_string(),
            vout,
            satoshi: self.value,
            address: queried_address.to_string(),
            script_pk: String::new(),
            listed_locked: false,
            inscriptions: self.inscriptions,
            runes: self.runes,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OrdiscanEnvelope {
    data: Option<Vec<OrdiscanUtxo>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodedUtxoData {
    #[serde(default)]
    available_utxos: Vec<RawUtxo>,
    #[serde(default)]
    locked_utxos: Vec<RawUtxo>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UtxoListEnvelope {
    Coded {
        code: i64,
        #[serde(default)]
        msg: Option<String>,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        data: Option<CodedUtxoData>,
    },
    Wrapped {
        success: bool,
        #[serde(default)]
        data: Option<Vec<RawUtxo>>,
        #[serde(default)]
        error: Option<String>,
    },
    Bare(Vec<RawUtxo>),
    Data {
        data: Vec<RawUtxo>,
    },
    Utxos {
        utxos: Vec<RawUtxo>,
    },
    Results {
        results: Vec<RawUtxo>,
    },
}

#[derive(Debug, Deserialize)]
struct CodedStatusData {
    #[serde(default)]
    available: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// A status object. Only `status` is required; the rest is filled in from the query and
/// the status itself.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LooseStatus {
    #[serde(default, alias = "txId")]
    txid: Option<String>,
    #[serde(default, alias = "vOut", deserialize_with = "crate::serde::deserialize_option_u32")]
    vout: Option<u32>,
    status: StatusKind,
    #[serde(default)]
    is_spent: Option<bool>,
    #[serde(default)]
    is_locked: Option<bool>,
}

impl LooseStatus {
    fn resolve(self, txid: &str, vout: u32) -> UtxoStatus {
        let status = self.status;

        UtxoStatus {
            txid: self
                .txid
                .filter(|txid| !txid.is_empty())
                .unwrap_or_else(|| txid.to_string()),
            vout: self.vout.unwrap_or(vout),
            status,
            is_spent: self
                .is_spent
                .unwrap_or(matches!(status, StatusKind::Spent | StatusKind::Pending)),
            is_locked: self.is_locked.unwrap_or(status == StatusKind::Locked),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatusEnvelope {
    Coded {
        code: i64,
        #[serde(default)]
        msg: Option<String>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        data: Option<CodedStatusData>,
    },
    Wrapped {
        success: bool,
        #[serde(default)]
        data: Option<LooseStatus>,
        #[serde(default)]
        error: Option<String>,
    },
    Direct(LooseStatus),
}

fn coded_failure(code: i64, messages: [Option<String>; 3]) -> IndexerError {
    let message = messages
        .into_iter()
        .flatten()
        .find(|message| !message.is_empty())
        .unwrap_or_else(|| format!("API error (code: {code})"));

    IndexerError::Api(message)
}

/// Extracts the UTXO list from any known list envelope.
///
/// Entries listed as market-locked are marked `listed_locked`.
pub(crate) fn parse_utxo_response(
    body: Value,
    queried_address: &str,
) -> Result<Vec<IndexerUtxo>, IndexerError> {
    let envelope: UtxoListEnvelope =
        serde_json::from_value(body).map_err(|_| IndexerError::UnrecognizedResponseShape)?;

    let available = |entries: Vec<RawUtxo>| {
        entries
            .into_iter()
            .map(|raw| raw.normalize(queried_address, false))
            .collect::<Vec<_>>()
    };

    match envelope {
        UtxoListEnvelope::Coded { code: 0, data, .. } => {
            let data = data.ok_or(IndexerError::UnrecognizedResponseShape)?;
            let mut utxos = available(data.available_utxos);
            utxos.extend(
                data.locked_utxos
                    .into_iter()
                    .map(|raw| raw.normalize(queried_address, true)),
            );
            Ok(utxos)
        }
        UtxoListEnvelope::Coded {
            code, msg, error, ..
        } => Err(coded_failure(code, [msg, error, None])),
        UtxoListEnvelope::Wrapped {
            success: true,
            data: Some(data),
            ..
        } => Ok(available(data)),
        UtxoListEnvelope::Wrapped {
            success: false,
            error,
            ..
        } => Err(IndexerError::Api(
            error.unwrap_or_else(|| "failed to fetch utxos".to_string()),
        )),
        UtxoListEnvelope::Wrapped { data: None, .. } => {
            Err(IndexerError::UnrecognizedResponseShape)
        }
        UtxoListEnvelope::Bare(data)
        | UtxoListEnvelope::Data { data }
        | UtxoListEnvelope::Utxos { utxos: data }
        | UtxoListEnvelope::Results { results: data } => Ok(available(data)),
    }
}

/// Extracts the UTXO list from an ordinals-aware `{ "data": [..] }` listing.
///
/// A missing or `null` list is empty. A body that is not an object is unrecognized.
pub(crate) fn parse_ordiscan_response(
    body: Value,
    queried_address: &str,
) -> Result<Vec<IndexerUtxo>, IndexerError> {
    let envelope: OrdiscanEnvelope =
        serde_json::from_value(body).map_err(|_| IndexerError::UnrecognizedResponseShape)?;

    match envelope.data {
        Some(entries) => entries
            .into_iter()
            .map(|entry| entry.normalize(queried_address))
            .collect(),
        None => Ok(vec![]),
    }
}

/// Extracts the status of `txid:vout` from any known status envelope.
pub(crate) fn parse_status_response(
    body: Value,
    txid: &str,
    vout: u32,
) -> Result<UtxoStatus, IndexerError> {
    let envelope: StatusEnvelope =
        serde_json::from_value(body).map_err(|_| IndexerError::UnrecognizedResponseShape)?;

    match envelope {
        StatusEnvelope::Coded {
            code: 0,
            data: Some(data),
            ..
        } => Ok(UtxoStatus::from_availability(
            txid,
            vout,
            data.available,
            data.reason.as_deref().unwrap_or_default(),
        )),
        StatusEnvelope::Coded { code: 0, .. } => Err(IndexerError::UnrecognizedResponseShape),
        StatusEnvelope::Coded {
            code,
            msg,
            message,
            error,
            ..
        } => Err(coded_failure(code, [msg, message, error])),
        StatusEnvelope::Wrapped {
            success: true,
            data: Some(status),
            ..
        } => Ok(status.resolve(txid, vout)),
        StatusEnvelope::Wrapped {
            success: false,
            error,
            ..
        } => Err(IndexerError::Api(
            error.unwrap_or_else(|| "failed to fetch utxo status".to_string()),
        )),
        StatusEnvelope::Wrapped { data: None, .. } => Err(IndexerError::UnrecognizedResponseShape),
        StatusEnvelope::Direct(status) => Ok(status.resolve(txid, vout)),
    }
}
