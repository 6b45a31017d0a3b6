//! Read-only breakdown of PSBTs and raw transactions for display.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bitcoin::{
    consensus::encode::deserialize, script::Instruction, Address, Network, Psbt, Script,
    Transaction,
};

use crate::error::DecodeError;

const PSBT_BASE64_PREFIX: &str = "cHNidA";
const PSBT_MAGIC_FIRST_BYTE: u8 = 0x70;

/// What a payload turned out to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PayloadKind {
    #[cfg_attr(feature = "serde", serde(rename = "PSBT"))]
    Psbt,
    #[cfg_attr(feature = "serde", serde(rename = "Transaction"))]
    RawTransaction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DecodedTransaction {
    pub kind: PayloadKind,
    pub version: i32,
    pub lock_time: u32,
    pub inputs: Vec<DecodedInput>,
    pub outputs: Vec<DecodedOutput>,
    /// Only set for PSBTs: whether every input carries a final script.
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub is_finalized: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecodedInput {
    /// Big-endian display form.
    pub txid: String,
    pub vout: u32,
    pub sequence: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DecodedOutput {
    pub index: usize,
    pub value: u64,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub address: Option<String>,
    pub script_pubkey: String,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub op_return: Option<OpReturnData>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OpReturnData {
    pub hex: String,
    /// The payload as text, when it is entirely printable ASCII.
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub text: Option<String>,
}

/// Classifies `input` as a PSBT or a raw transaction without fully parsing it.
///
/// Accepts hex (whitespace is ignored) or base64.
pub fn detect_kind(input: &str) -> Result<PayloadKind, DecodeError> {
    payload(input).map(|(kind, _)| kind)
}

/// Decodes a hex or base64 PSBT, or a hex or base64 raw transaction.
///
/// Output addresses are rendered under `network` wherever the script is a standard one.
pub fn decode(input: &str, network: Network) -> Result<DecodedTransaction, DecodeError> {
    let (kind, bytes) = payload(input)?;

    match kind {
        PayloadKind::Psbt => {
            let psbt = Psbt::deserialize(&bytes).map_err(|e| DecodeError::Psbt(e.to_string()))?;
            let is_finalized = psbt
                .inputs
                .iter()
                .all(|input| input.final_script_sig.is_some() || input.final_script_witness.is_some());

            let mut decoded = describe(kind, &psbt.unsigned_tx, network);
            decoded.is_finalized = Some(is_finalized);
            Ok(decoded)
        }
        PayloadKind::RawTransaction => {
            let transaction: Transaction =
                deserialize(&bytes).map_err(|e| DecodeError::Transaction(e.to_string()))?;

            Ok(describe(kind, &transaction, network))
        }
    }
}

fn payload(input: &str) -> Result<(PayloadKind, Vec<u8>), DecodeError> {
    let clean: String = input.chars().filter(|c| !c.is_whitespace()).collect();

    if clean.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = if clean.starts_with(PSBT_BASE64_PREFIX) {
        STANDARD
            .decode(&clean)
            .map_err(|e| DecodeError::Psbt(e.to_string()))?
    } else {
        match hex::decode(&clean) {
            Ok(bytes) => bytes,
            Err(hex::FromHexError::OddLength) if STANDARD.decode(&clean).is_err() => {
                return Err(DecodeError::OddLength)
            }
            Err(_) => STANDARD
                .decode(&clean)
                .map_err(|_| DecodeError::UnrecognizedPayload)?,
        }
    };

    let kind = match bytes.first() {
        Some(&PSBT_MAGIC_FIRST_BYTE) => PayloadKind::Psbt,
        Some(0x01) | Some(0x02) => PayloadKind::RawTransaction,
        Some(_) => return Err(DecodeError::UnrecognizedPayload),
        None => return Err(DecodeError::Empty),
    };

    Ok((kind, bytes))
}

fn describe(kind: PayloadKind, transaction: &Transaction, network: Network) -> DecodedTransaction {
    let inputs = transaction
        .input
        .iter()
        .map(|txin| DecodedInput {
            txid: txin.previous_output.txid.to_string(),
            vout: txin.previous_output.vout,
            sequence: txin.sequence.0,
        })
        .collect();

    let outputs = transaction
        .output
        .iter()
        .enumerate()
        .map(|(index, txout)| {
            let script = txout.script_pubkey.as_script();
            let op_return = op_return_data(script);
            let address = if script.is_op_return() {
                None
            } else {
                Address::from_script(script, network)
                    .ok()
                    .map(|address| address.to_string())
            };

            DecodedOutput {
                index,
                value: txout.value.to_sat(),
                address,
                script_pubkey: script.to_hex_string(),
                op_return,
            }
        })
        .collect();

    DecodedTransaction {
        kind,
        version: transaction.version.0,
        lock_time: transaction.lock_time.to_consensus_u32(),
        inputs,
        outputs,
        is_finalized: None,
    }
}

fn op_return_data(script: &Script) -> Option<OpReturnData> {
    if !script.is_op_return() {
        return None;
    }

    let mut data = Vec::new();
    // The first instruction is OP_RETURN itself.
    for instruction in script.instructions().skip(1) {
        match instruction {
            Ok(Instruction::PushBytes(bytes)) => data.extend_from_slice(bytes.as_bytes()),
            Ok(Instruction::Op(_)) => {}
            Err(_) => break,
        }
    }

    if data.is_empty() {
        return None;
    }

    let text = data
        .iter()
        .all(|byte| matches!(byte, 0x20..=0x7e | b'\n' | b'\r' | b'\t'))
        .then(|| String::from_utf8_lossy(&data).into_owned());

    Some(OpReturnData {
        hex: hex::encode(&data),
        text,
    })
}
