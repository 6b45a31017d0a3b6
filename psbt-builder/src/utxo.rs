use std::{fmt, str::FromStr};

use bitcoin::{Network, OutPoint, Txid};

use crate::error::InputError;

/// A spendable prior output selected for spending.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UtxoInput {
    /// Transaction id in its big-endian display form.
    pub txid: String,
    pub vout: u32,
    /// Satoshis held by the output.
    pub value: u64,
    /// Owner of the output; used to derive the spending script when `script_pk` is absent.
    pub address: String,
    /// Locking script hex. Takes precedence over `address` when present.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub script_pk: Option<String>,
}

impl UtxoInput {
    pub fn new(txid: impl Into<String>, vout: u32, value: u64, address: impl Into<String>) -> Self {
        Self {
            txid: txid.into(),
            vout,
            value,
            address: address.into(),
            script_pk: None,
        }
    }

    pub fn with_script_pk(mut self, script_pk: impl Into<String>) -> Self {
        self.script_pk = Some(script_pk.into());
        self
    }

    /// Parses the display-order txid into the outpoint the transaction encodes.
    pub fn outpoint(&self) -> Result<OutPoint, InputError> {
        let txid = Txid::from_str(self.txid.trim())
            .map_err(|e| InputError::InvalidTxid(e.to_string()))?;

        Ok(OutPoint::new(txid, self.vout))
    }

    pub(crate) fn script_pubkey(&self, network: Network) -> Result<bitcoin::ScriptBuf, InputError> {
        crate::script::resolve_input_script(self.script_pk.as_deref(), &self.address, network)
            .map_err(InputError::from)
    }
}

impl fmt::Display for UtxoInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// A desired payment.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Output {
    pub address: String,
    /// Satoshis to deliver.
    pub amount: u64,
}

impl Output {
    pub fn new(address: impl Into<String>, amount: u64) -> Self {
        Self {
            address: address.into(),
            amount,
        }
    }
}
