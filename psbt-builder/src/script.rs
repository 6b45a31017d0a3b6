//! Address to locking-script resolution.
//!
//! Classification goes through the address type decoded by the `bitcoin` codec rather
//! than string prefixes, so new address formats are rejected explicitly instead of being
//! silently mis-classified.

use std::str::FromStr;

use bitcoin::{address::NetworkUnchecked, Address, AddressType, Network, ScriptBuf};

use crate::error::AddressError;

/// Script types the builder knows how to pay to and spend from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScriptKind {
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
    P2tr,
}

impl ScriptKind {
    fn from_address_type(address_type: AddressType) -> Option<Self> {
        match address_type {
            AddressType::P2pkh => Some(ScriptKind::P2pkh),
            AddressType::P2sh => Some(ScriptKind::P2sh),
            AddressType::P2wpkh => Some(ScriptKind::P2wpkh),
            AddressType::P2wsh => Some(ScriptKind::P2wsh),
            AddressType::P2tr => Some(ScriptKind::P2tr),
            _ => None,
        }
    }

    pub fn is_segwit(&self) -> bool {
        !matches!(self, ScriptKind::P2pkh | ScriptKind::P2sh)
    }
}

/// A destination whose locking script has been resolved under a network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub script_pubkey: ScriptBuf,
    pub kind: ScriptKind,
}

/// Parses `address`, requires it to belong to `network` and returns its locking script.
pub fn resolve_address(address: &str, network: Network) -> Result<ResolvedAddress, AddressError> {
    let trimmed = address.trim();

    let unchecked = Address::<NetworkUnchecked>::from_str(trimmed).map_err(|e| {
        AddressError::Malformed {
            address: trimmed.to_string(),
            reason: e.to_string(),
        }
    })?;

    let checked = unchecked
        .require_network(network)
        .map_err(|_| AddressError::WrongNetwork {
            address: trimmed.to_string(),
            expected: network,
        })?;

    let kind = checked
        .address_type()
        .and_then(ScriptKind::from_address_type)
        .ok_or_else(|| AddressError::UnsupportedScriptType(trimmed.to_string()))?;

    Ok(ResolvedAddress {
        script_pubkey: checked.script_pubkey(),
        kind,
    })
}

/// Locking script of a UTXO being spent.
///
/// A non-empty `script_pk` is used verbatim; otherwise the script is derived from
/// `address` under `network`.
pub fn resolve_input_script(
    script_pk: Option<&str>,
    address: &str,
    network: Network,
) -> Result<ScriptBuf, AddressError> {
    match script_pk.map(str::trim).filter(|script| !script.is_empty()) {
        Some(script) => {
            ScriptBuf::from_hex(script).map_err(|e| AddressError::InvalidScriptHex {
                script: script.to_string(),
                reason: e.to_string(),
            })
        }
        None => resolve_address(address, network).map(|resolved| resolved.script_pubkey),
    }
}
