//! Unsigned PSBT construction for the wallet console.
//!
//! This crate turns a set of caller-selected UTXOs, the payments to make, a change
//! address and a fee rate into an unsigned partially-signed Bitcoin transaction that can
//! be handed to the wallet extension for signing.
//!
//! ## Key Features
//!
//! - **Network resolution**: wallet chain identifiers map onto mainnet or testnet address
//!   parameters ([`resolve_network`])
//! - **Duplicate-safe input assembly**: the same `(txid, vout)` is never spent twice
//!   ([`add_input_if_not_duplicate`])
//! - **Byte-model fee estimation**: deterministic, network agnostic ([`estimate_fee`])
//! - **Change handling**: remainders above the dust limit go back to the change address,
//!   smaller ones are absorbed into the fee
//! - **Decoding**: human-readable breakdown of PSBTs and raw transactions ([`decode`])
//!
//! ## Quick Start
//!
//! ```rust
//! use console_psbt_builder::{build, BuildRequest, FeeRate, Output, UtxoInput};
//! use bitcoin::Network;
//!
//! let request = BuildRequest {
//!     inputs: vec![UtxoInput::new(
//!         "c5cc9251192330191366016c8dab0f67dc345bd024a206c313dbf26db0a66bb1",
//!         0,
//!         100_000,
//!         "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
//!     )],
//!     outputs: vec![Output::new(
//!         "bc1p0xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqzk5jj0",
//!         50_000,
//!     )],
//!     change_address: "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4".to_string(),
//!     fee_rate: FeeRate::default(),
//!     network: Network::Bitcoin,
//! };
//!
//! let result = build(&request)?;
//! assert_eq!(result.fee, 84);
//! assert_eq!(result.change_amount, 49_916);
//! # Ok::<(), console_psbt_builder::error::PsbtBuildError>(())
//! ```
//!
//! Every call is independent: the builder keeps no state between builds and each build
//! assembles its own transaction, so concurrent callers never share anything.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bitcoin::{
    absolute::LockTime, psbt, transaction::Version, Amount, Network, Psbt, ScriptBuf, Sequence,
    Transaction, TxIn, TxOut, Witness,
};

use crate::{
    constants::DUST_LIMIT,
    error::PsbtBuildError,
    fee::{remaining_after_outputs, settle_change, ChangeSettlement},
    input_calc::estimated_vsize,
    script::resolve_address,
};

pub mod constants;
pub mod decode;
pub mod error;
mod fee;
pub mod fee_rate;
pub mod input_calc;
pub mod network;
pub mod script;
mod utxo;

pub use decode::{decode, DecodedTransaction};
pub use fee::estimate_fee;
pub use fee_rate::FeeRate;
pub use network::{resolve_network, ChainType};
pub use utxo::{Output, UtxoInput};

/// Everything needed for one build. Constructed fresh per call and consumed once.
#[derive(Clone, Debug)]
pub struct BuildRequest {
    pub inputs: Vec<UtxoInput>,
    pub outputs: Vec<Output>,
    pub change_address: String,
    pub fee_rate: FeeRate,
    pub network: Network,
}

/// The unsigned PSBT together with the fee it pays and the change it returns.
///
/// For every successful build `total input == total output + fee + change_amount`.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildResult {
    pub psbt: Psbt,
    /// Satoshis paid to the network, including any remainder absorbed as dust.
    pub fee: u64,
    /// Value of the change output, or `0` when no change output was added.
    pub change_amount: u64,
    /// Virtual size estimated by the byte model for the final transaction shape.
    pub vsize: usize,
}

impl BuildResult {
    pub fn psbt_hex(&self) -> String {
        psbt_to_hex(&self.psbt)
    }

    pub fn psbt_base64(&self) -> String {
        psbt_to_base64(&self.psbt)
    }
}

/// Serializes a PSBT to the lowercase hex the wallet extension's `signPsbt` expects.
pub fn psbt_to_hex(psbt: &Psbt) -> String {
    hex::encode(psbt.serialize())
}

pub fn psbt_to_base64(psbt: &Psbt) -> String {
    STANDARD.encode(psbt.serialize())
}

/// Appends `input` to `psbt` unless an input spending the same `(txid, vout)` is already
/// present.
///
/// Returns `Ok(false)` without touching `psbt` for a duplicate. Otherwise the unsigned
/// input is appended together with the spent output (script and value) as its
/// `witness_utxo`, which is what an external signer needs to know what it is signing.
///
/// Any failure names the offending `txid:vout`.
pub fn add_input_if_not_duplicate(
    psbt: &mut Psbt,
    input: &UtxoInput,
    network: Network,
) -> Result<bool, PsbtBuildError> {
    let invalid = |source| PsbtBuildError::InvalidInput {
        outpoint: input.to_string(),
        source,
    };

    let outpoint = input.outpoint().map_err(invalid)?;

    if psbt
        .unsigned_tx
        .input
        .iter()
        .any(|existing| existing.previous_output == outpoint)
    {
        tracing::debug!(outpoint = %outpoint, "skipping duplicate input");
        return Ok(false);
    }

    let script_pubkey = input.script_pubkey(network).map_err(invalid)?;

    psbt.unsigned_tx.input.push(TxIn {
        previous_output: outpoint,
        script_sig: ScriptBuf::new(),
        sequence: Sequence::MAX,
        witness: Witness::new(),
    });
    psbt.inputs.push(psbt::Input {
        witness_utxo: Some(TxOut {
            value: Amount::from_sat(input.value),
            script_pubkey,
        }),
        ..Default::default()
    });

    Ok(true)
}

/// Assembles one unsigned PSBT while keeping track of the value it spends.
///
/// [`build`] drives it through the fixed sequence of validation gates; it is exposed so
/// callers can compose their own flows on top of the same input/output primitives.
#[derive(Debug)]
pub struct PsbtBuilder {
    psbt: Psbt,
    network: Network,
    total_input: u64,
    total_output: u64,
}

impl PsbtBuilder {
    /// Creates a builder around an empty version 2 transaction with `lock_time = 0`.
    pub fn new(network: Network) -> Result<Self, PsbtBuildError> {
        let transaction = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![],
            output: vec![],
        };

        let psbt = Psbt::from_unsigned_tx(transaction)
            .map_err(|e| PsbtBuildError::Codec(e.to_string()))?;

        Ok(Self {
            psbt,
            network,
            total_input: 0,
            total_output: 0,
        })
    }

    /// Adds `input` unless it is a duplicate; only added inputs count towards the total.
    pub fn add_input(&mut self, input: &UtxoInput) -> Result<bool, PsbtBuildError> {
        let added = add_input_if_not_duplicate(&mut self.psbt, input, self.network)?;

        if added {
            self.total_input = self
                .total_input
                .checked_add(input.value)
                .ok_or(PsbtBuildError::AmountOverflow)?;
        }

        Ok(added)
    }

    /// Appends a payment after resolving its destination under the builder's network.
    pub fn add_output(&mut self, output: &Output) -> Result<(), PsbtBuildError> {
        let resolved = resolve_address(&output.address, self.network).map_err(|source| {
            PsbtBuildError::InvalidOutputAddress {
                address: output.address.clone(),
                source,
            }
        })?;

        self.push_output(resolved.script_pubkey, output.amount)
    }

    fn push_output(&mut self, script_pubkey: ScriptBuf, amount: u64) -> Result<(), PsbtBuildError> {
        self.total_output = self
            .total_output
            .checked_add(amount)
            .ok_or(PsbtBuildError::AmountOverflow)?;

        self.psbt.unsigned_tx.output.push(TxOut {
            value: Amount::from_sat(amount),
            script_pubkey,
        });
        self.psbt.outputs.push(psbt::Output::default());

        Ok(())
    }

    pub fn input_count(&self) -> usize {
        self.psbt.unsigned_tx.input.len()
    }

    pub fn output_count(&self) -> usize {
        self.psbt.unsigned_tx.output.len()
    }

    pub fn total_input(&self) -> u64 {
        self.total_input
    }

    pub fn total_output(&self) -> u64 {
        self.total_output
    }

    pub fn psbt(&self) -> &Psbt {
        &self.psbt
    }

    pub fn into_psbt(self) -> Psbt {
        self.psbt
    }
}

/// Builds an unsigned PSBT from `request`.
///
/// Gates run in a fixed order and the first failure aborts the whole build:
///
/// 1. `inputs` must be non-empty, then `outputs` must be non-empty.
/// 2. Inputs are added with duplicates skipped; at least one must survive.
/// 3. Every output address must resolve under `request.network`.
/// 4. A provisional fee is estimated without change; if the inputs cannot cover the
///    outputs plus that fee the build fails with the exact shortfall.
/// 5. A remainder above [`DUST_LIMIT`] becomes a change output to `change_address` and
///    the fee is estimated a second time with that output counted. A smaller remainder
///    is absorbed into the fee.
///
/// The fee is estimated twice, never iterated to a fixed point.
pub fn build(request: &BuildRequest) -> Result<BuildResult, PsbtBuildError> {
    if request.inputs.is_empty() {
        return Err(PsbtBuildError::NoInputs);
    }

    if request.outputs.is_empty() {
        return Err(PsbtBuildError::NoOutputs);
    }

    let mut builder = PsbtBuilder::new(request.network)?;

    let mut added_inputs = 0;
    for input in &request.inputs {
        if builder.add_input(input)? {
            added_inputs += 1;
        }
    }

    if added_inputs == 0 {
        return Err(PsbtBuildError::AllInputsDuplicate);
    }

    for output in &request.outputs {
        builder.add_output(output)?;
    }

    let input_count = builder.input_count();
    let output_count = builder.output_count();

    let provisional_fee = estimate_fee(input_count, output_count, &request.fee_rate);
    let remaining = remaining_after_outputs(
        builder.total_input(),
        builder.total_output(),
        provisional_fee,
    )?;
    let candidate_change = remaining - provisional_fee;

    let (fee, change_amount) = if candidate_change > DUST_LIMIT {
        let change_script = resolve_address(&request.change_address, request.network)
            .map_err(|source| PsbtBuildError::InvalidChangeAddress {
                address: request.change_address.clone(),
                source,
            })?
            .script_pubkey;

        match settle_change(remaining, input_count, output_count + 1, &request.fee_rate) {
            ChangeSettlement::Keep { fee, change } => {
                builder.push_output(change_script, change)?;
                (fee, change)
            }
            ChangeSettlement::Drop { fee } => {
                tracing::debug!(
                    remaining,
                    "change output cannot pay for itself, absorbing into fee"
                );
                (fee, 0)
            }
        }
    } else {
        tracing::debug!(candidate_change, "remainder at or below dust, absorbing into fee");
        (remaining, 0)
    };

    let vsize = estimated_vsize(input_count, builder.output_count());

    tracing::info!(
        inputs = input_count,
        outputs = builder.output_count(),
        fee,
        change_amount,
        fee_rate = %request.fee_rate,
        "built unsigned psbt"
    );

    Ok(BuildResult {
        psbt: builder.into_psbt(),
        fee,
        change_amount,
        vsize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AddressError, InputError};
    use proptest::prelude::*;

    const TXID_A: &str = "c5cc9251192330191366016c8dab0f67dc345bd024a206c313dbf26db0a66bb1";
    const TXID_B: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const SENDER: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
    const RECIPIENT: &str = "bc1p0xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqzk5jj0";
    const LEGACY_RECIPIENT: &str = "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2";
    const TESTNET_ADDRESS: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";

    fn utxo(txid: &str, vout: u32, value: u64) -> UtxoInput {
        UtxoInput::new(txid, vout, value, SENDER)
    }

    fn request(inputs: Vec<UtxoInput>, outputs: Vec<Output>) -> BuildRequest {
        BuildRequest {
            inputs,
            outputs,
            change_address: SENDER.to_string(),
            fee_rate: FeeRate::default(),
            network: Network::Bitcoin,
        }
    }

    fn empty_psbt() -> Psbt {
        PsbtBuilder::new(Network::Bitcoin).unwrap().into_psbt()
    }

    mod add_input_if_not_duplicate {
        use super::*;

        #[test]
        fn test_appends_input_with_witness_utxo() {
            let mut psbt = empty_psbt();
            let added =
                add_input_if_not_duplicate(&mut psbt, &utxo(TXID_A, 1, 10_000), Network::Bitcoin)
                    .unwrap();

            assert!(added);
            assert_eq!(psbt.unsigned_tx.input.len(), 1);
            assert_eq!(psbt.inputs.len(), 1);

            let txin = &psbt.unsigned_tx.input[0];
            assert_eq!(txin.previous_output.txid.to_string(), TXID_A);
            assert_eq!(txin.previous_output.vout, 1);
            assert_eq!(txin.sequence, Sequence::MAX);
            assert!(txin.script_sig.is_empty());

            let witness_utxo = psbt.inputs[0].witness_utxo.as_ref().unwrap();
            assert_eq!(witness_utxo.value.to_sat(), 10_000);
            assert!(witness_utxo.script_pubkey.is_p2wpkh());
        }

        #[test]
        fn test_skips_duplicates_without_mutation() {
            let mut psbt = empty_psbt();
            let input = utxo(TXID_A, 0, 10_000);

            assert!(add_input_if_not_duplicate(&mut psbt, &input, Network::Bitcoin).unwrap());
            let before = psbt.clone();

            let duplicate = utxo(TXID_A, 0, 99_999);
            assert!(!add_input_if_not_duplicate(&mut psbt, &duplicate, Network::Bitcoin).unwrap());
            assert_eq!(psbt, before);
        }

        #[test]
        fn test_same_txid_different_vout_is_not_a_duplicate() {
            let mut psbt = empty_psbt();

            assert!(add_input_if_not_duplicate(&mut psbt, &utxo(TXID_A, 0, 1), Network::Bitcoin).unwrap());
            assert!(add_input_if_not_duplicate(&mut psbt, &utxo(TXID_A, 1, 1), Network::Bitcoin).unwrap());
            assert_eq!(psbt.unsigned_tx.input.len(), 2);
        }

        #[test]
        fn test_uppercase_txid_matches_lowercase_duplicate() {
            let mut psbt = empty_psbt();

            assert!(add_input_if_not_duplicate(&mut psbt, &utxo(TXID_A, 0, 1), Network::Bitcoin).unwrap());
            let upper = utxo(&TXID_A.to_uppercase(), 0, 1);
            assert!(!add_input_if_not_duplicate(&mut psbt, &upper, Network::Bitcoin).unwrap());
        }

        #[test]
        fn test_script_pk_is_used_verbatim() {
            let mut psbt = empty_psbt();
            let input = UtxoInput::new(TXID_A, 0, 1_000, "ignored").with_script_pk(
                "51200000000000000000000000000000000000000000000000000000000000000000",
            );

            assert!(add_input_if_not_duplicate(&mut psbt, &input, Network::Bitcoin).unwrap());
            let script = &psbt.inputs[0].witness_utxo.as_ref().unwrap().script_pubkey;
            assert!(script.is_p2tr());
        }

        #[test]
        fn test_wrong_network_address_names_the_outpoint() {
            let mut psbt = empty_psbt();
            let input = UtxoInput::new(TXID_A, 4, 1_000, TESTNET_ADDRESS);

            let err = add_input_if_not_duplicate(&mut psbt, &input, Network::Bitcoin).unwrap_err();
            match err {
                PsbtBuildError::InvalidInput { outpoint, source } => {
                    assert_eq!(outpoint, format!("{TXID_A}:4"));
                    assert!(matches!(
                        source,
                        InputError::Script(AddressError::WrongNetwork { .. })
                    ));
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert!(psbt.unsigned_tx.input.is_empty());
            assert!(psbt.inputs.is_empty());
        }

        #[test]
        fn test_invalid_txid_names_the_outpoint() {
            let mut psbt = empty_psbt();
            let err = add_input_if_not_duplicate(&mut psbt, &utxo("xyz", 0, 1), Network::Bitcoin)
                .unwrap_err();

            assert!(err.to_string().starts_with("failed to add input xyz:0"));
        }
    }

    mod build {
        use super::*;

        #[test]
        fn test_rejects_empty_inputs() {
            let req = request(vec![], vec![Output::new(RECIPIENT, 1_000)]);
            assert_eq!(build(&req), Err(PsbtBuildError::NoInputs));
        }

        #[test]
        fn test_rejects_empty_outputs() {
            let req = request(vec![utxo(TXID_A, 0, 1_000)], vec![]);
            assert_eq!(build(&req), Err(PsbtBuildError::NoOutputs));
        }

        #[test]
        fn test_empty_inputs_are_checked_before_empty_outputs() {
            let req = request(vec![], vec![]);
            assert_eq!(build(&req), Err(PsbtBuildError::NoInputs));
        }

        #[test]
        fn test_concrete_scenario_with_change() {
            let req = request(
                vec![utxo(TXID_A, 0, 100_000)],
                vec![Output::new(RECIPIENT, 50_000)],
            );
            let result = build(&req).unwrap();

            assert_eq!(result.fee, 84);
            assert_eq!(result.change_amount, 49_916);
            assert_eq!(result.vsize, 84);

            let outputs = &result.psbt.unsigned_tx.output;
            assert_eq!(outputs.len(), 2);
            assert_eq!(outputs[0].value.to_sat(), 50_000);
            assert!(outputs[0].script_pubkey.is_p2tr());
            assert_eq!(outputs[1].value.to_sat(), 49_916);
            assert!(outputs[1].script_pubkey.is_p2wpkh());
            assert_eq!(result.psbt.outputs.len(), 2);
        }

        #[test]
        fn test_dust_remainder_is_absorbed_into_fee() {
            // Provisional fee 75; remainder 546 is not above the dust limit.
            let req = request(
                vec![utxo(TXID_A, 0, 50_621)],
                vec![Output::new(RECIPIENT, 50_000)],
            );
            let result = build(&req).unwrap();

            assert_eq!(result.change_amount, 0);
            assert_eq!(result.fee, 621);
            assert_eq!(result.psbt.unsigned_tx.output.len(), 1);
        }

        #[test]
        fn test_one_sat_above_dust_creates_change() {
            // Remainder after provisional fee is 547.
            let req = request(
                vec![utxo(TXID_A, 0, 50_622)],
                vec![Output::new(RECIPIENT, 50_000)],
            );
            let result = build(&req).unwrap();

            // Second pass: fee 84, change 622 - 84 = 538 (kept, below dust after re-estimate)
            assert_eq!(result.fee, 84);
            assert_eq!(result.change_amount, 538);
            assert_eq!(result.psbt.unsigned_tx.output.len(), 2);
        }

        #[test]
        fn test_change_that_cannot_pay_for_itself_is_dropped() {
            // Provisional fee 7_500 leaves 600 above dust, but the change output raises
            // the fee to 8_400, more than the 8_100 remaining.
            let mut req = request(
                vec![utxo(TXID_A, 0, 58_100)],
                vec![Output::new(RECIPIENT, 50_000)],
            );
            req.fee_rate = FeeRate::try_from(100.0).unwrap();
            let result = build(&req).unwrap();

            assert_eq!(result.fee, 8_100);
            assert_eq!(result.change_amount, 0);
            assert_eq!(result.psbt.unsigned_tx.output.len(), 1);
            assert_eq!(result.psbt.unsigned_tx.output[0].value.to_sat(), 50_000);
        }

        #[test]
        fn test_insufficient_funds_reports_shortfall() {
            let req = request(
                vec![utxo(TXID_A, 0, 50_074)],
                vec![Output::new(RECIPIENT, 50_000)],
            );
            assert_eq!(
                build(&req),
                Err(PsbtBuildError::InsufficientFunds { shortfall: 1 })
            );
        }

        #[test]
        fn test_highest_fee_rate_reports_shortfall() {
            let mut req = request(
                vec![utxo(TXID_A, 0, 50_074)],
                vec![Output::new(RECIPIENT, 50_000)],
            );
            req.fee_rate = FeeRate::try_from(crate::constants::MAX_FEE_RATE).unwrap();

            // 75 vB * 100_000 sat/vB
            assert_eq!(
                build(&req),
                Err(PsbtBuildError::InsufficientFunds {
                    shortfall: 50_000 + 7_500_000 - 50_074
                })
            );
        }

        #[test]
        fn test_exact_cover_succeeds_without_change() {
            let req = request(
                vec![utxo(TXID_A, 0, 50_075)],
                vec![Output::new(RECIPIENT, 50_000)],
            );
            let result = build(&req).unwrap();

            assert_eq!(result.fee, 75);
            assert_eq!(result.change_amount, 0);
        }

        #[test]
        fn test_duplicate_inputs_are_dropped_not_summed() {
            let single = request(
                vec![utxo(TXID_A, 0, 100_000)],
                vec![Output::new(RECIPIENT, 50_000)],
            );
            let doubled = request(
                vec![utxo(TXID_A, 0, 100_000), utxo(TXID_A, 0, 100_000)],
                vec![Output::new(RECIPIENT, 50_000)],
            );

            assert_eq!(build(&single).unwrap(), build(&doubled).unwrap());
        }

        #[test]
        fn test_invalid_output_address_is_named() {
            let req = request(
                vec![utxo(TXID_A, 0, 100_000)],
                vec![Output::new(TESTNET_ADDRESS, 50_000)],
            );

            match build(&req) {
                Err(PsbtBuildError::InvalidOutputAddress { address, .. }) => {
                    assert_eq!(address, TESTNET_ADDRESS)
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }

        #[test]
        fn test_invalid_change_address_fails_only_when_change_is_needed() {
            let mut req = request(
                vec![utxo(TXID_A, 0, 100_000)],
                vec![Output::new(RECIPIENT, 50_000)],
            );
            req.change_address = "garbage".to_string();

            assert!(matches!(
                build(&req),
                Err(PsbtBuildError::InvalidChangeAddress { .. })
            ));

            // No change output: the change address is never consulted.
            req.inputs = vec![utxo(TXID_A, 0, 50_075)];
            assert!(build(&req).is_ok());
        }

        #[test]
        fn test_input_errors_abort_before_outputs_are_checked() {
            let req = request(
                vec![UtxoInput::new(TXID_A, 0, 100_000, TESTNET_ADDRESS)],
                vec![Output::new("garbage", 50_000)],
            );
            assert!(matches!(
                build(&req),
                Err(PsbtBuildError::InvalidInput { .. })
            ));
        }

        #[test]
        fn test_multiple_outputs_and_mixed_script_types() {
            let req = request(
                vec![utxo(TXID_A, 0, 60_000), utxo(TXID_B, 2, 40_000)],
                vec![
                    Output::new(RECIPIENT, 30_000),
                    Output::new(LEGACY_RECIPIENT, 20_000),
                ],
            );
            let result = build(&req).unwrap();

            // Provisional: 10 + 510 + 68 = 588 -> 147; final: 622 -> 156
            assert_eq!(result.fee, 156);
            assert_eq!(result.change_amount, 100_000 - 50_000 - 156);
            assert!(result.psbt.unsigned_tx.output[1].script_pubkey.is_p2pkh());
        }

        #[test]
        fn test_testnet_build_accepts_testnet_addresses() {
            let req = BuildRequest {
                inputs: vec![UtxoInput::new(TXID_A, 0, 20_000, TESTNET_ADDRESS)],
                outputs: vec![Output::new(TESTNET_ADDRESS, 10_000)],
                change_address: TESTNET_ADDRESS.to_string(),
                fee_rate: FeeRate::try_from(2.0).unwrap(),
                network: Network::Testnet,
            };
            let result = build(&req).unwrap();

            assert_eq!(result.fee, 168);
            assert_eq!(result.change_amount, 20_000 - 10_000 - 168);
        }

        #[test]
        fn test_psbt_serializations_round_trip() {
            let req = request(
                vec![utxo(TXID_A, 0, 100_000)],
                vec![Output::new(RECIPIENT, 50_000)],
            );
            let result = build(&req).unwrap();

            let hex = result.psbt_hex();
            assert!(hex.starts_with("70736274ff"));
            assert!(result.psbt_base64().starts_with("cHNidP"));

            let bytes = hex::decode(hex).unwrap();
            assert_eq!(Psbt::deserialize(&bytes).unwrap(), result.psbt);
        }
    }

    mod psbt_builder {
        use super::*;

        #[test]
        fn test_creates_empty_version_two_transaction() {
            let builder = PsbtBuilder::new(Network::Bitcoin).unwrap();

            assert_eq!(builder.psbt().unsigned_tx.version, Version::TWO);
            assert_eq!(builder.psbt().unsigned_tx.lock_time, LockTime::ZERO);
            assert_eq!(builder.input_count(), 0);
            assert_eq!(builder.output_count(), 0);
            assert_eq!(builder.total_input(), 0);
            assert_eq!(builder.total_output(), 0);
        }

        #[test]
        fn test_tracks_totals_of_added_items_only() {
            let mut builder = PsbtBuilder::new(Network::Bitcoin).unwrap();

            builder.add_input(&utxo(TXID_A, 0, 7_000)).unwrap();
            builder.add_input(&utxo(TXID_A, 0, 7_000)).unwrap();
            builder.add_input(&utxo(TXID_B, 0, 3_000)).unwrap();
            builder.add_output(&Output::new(RECIPIENT, 4_000)).unwrap();

            assert_eq!(builder.total_input(), 10_000);
            assert_eq!(builder.total_output(), 4_000);
            assert_eq!(builder.input_count(), 2);
        }

        #[test]
        fn test_overflowing_output_total_is_reported() {
            let mut builder = PsbtBuilder::new(Network::Bitcoin).unwrap();

            builder.add_output(&Output::new(RECIPIENT, u64::MAX)).unwrap();
            assert_eq!(
                builder.add_output(&Output::new(RECIPIENT, 1)),
                Err(PsbtBuildError::AmountOverflow)
            );
        }
    }

    fn txid(n: u8) -> String {
        format!("{:064x}", n as u64 + 1)
    }

    proptest! {
        #[test]
        fn test_value_is_conserved(
            values in prop::collection::vec(1_000..5_000_000_u64, 1..6),
            payments in prop::collection::vec(546..1_000_000_u64, 1..4),
            fee_rate in 0.01..500.0_f64,
        ) {
            let inputs = values
                .iter()
                .enumerate()
                .map(|(i, value)| utxo(&txid(i as u8), 0, *value))
                .collect::<Vec<_>>();
            let outputs = payments
                .iter()
                .map(|amount| Output::new(RECIPIENT, *amount))
                .collect::<Vec<_>>();

            let mut req = request(inputs, outputs);
            req.fee_rate = FeeRate::try_from(fee_rate).unwrap();

            let total_in: u64 = values.iter().sum();
            let total_out: u64 = payments.iter().sum();

            match build(&req) {
                Ok(result) => {
                    prop_assert_eq!(total_in, total_out + result.fee + result.change_amount);
                    prop_assert_eq!(
                        result.psbt.unsigned_tx.output.len(),
                        payments.len() + usize::from(result.change_amount > 0)
                    );

                    let provisional = estimate_fee(values.len(), payments.len(), &req.fee_rate);
                    let candidate = total_in - total_out - provisional;
                    if candidate <= DUST_LIMIT {
                        prop_assert_eq!(result.change_amount, 0);
                        prop_assert_eq!(result.psbt.unsigned_tx.output.len(), payments.len());
                    }
                }
                Err(PsbtBuildError::InsufficientFunds { shortfall }) => {
                    let provisional = estimate_fee(values.len(), payments.len(), &req.fee_rate);
                    prop_assert_eq!(total_out + provisional - total_in, shortfall);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }

        #[test]
        fn test_duplicates_never_change_the_result(
            values in prop::collection::vec(10_000..1_000_000_u64, 1..5),
            duplicate_index in 0..5_usize,
        ) {
            let inputs = values
                .iter()
                .enumerate()
                .map(|(i, value)| utxo(&txid(i as u8), i as u32, *value))
                .collect::<Vec<_>>();
            let mut with_duplicate = inputs.clone();
            with_duplicate.push(inputs[duplicate_index % inputs.len()].clone());

            let outputs = vec![Output::new(RECIPIENT, 5_000)];

            prop_assert_eq!(
                build(&request(inputs, outputs.clone())),
                build(&request(with_duplicate, outputs))
            );
        }
    }
}
