use bitcoin::Network;
use thiserror::Error;

/// Reasons an address (or a raw locking script) could not be turned into a script.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("malformed address {address}: {reason}")]
    Malformed { address: String, reason: String },

    #[error("address {address} does not belong to network {expected}")]
    WrongNetwork { address: String, expected: Network },

    #[error("address {0} uses an unsupported script type")]
    UnsupportedScriptType(String),

    #[error("invalid script hex {script}: {reason}")]
    InvalidScriptHex { script: String, reason: String },
}

/// Reasons a single UTXO could not be appended to the transaction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("invalid txid: {0}")]
    InvalidTxid(String),

    #[error(transparent)]
    Script(#[from] AddressError),
}

#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum FeeRateError {
    #[error("fee rate must be a finite number")]
    NotFinite,

    #[error("fee rate {0} is below the minimum of 0.01 sat/vB")]
    TooLow(f64),

    #[error("fee rate {0} is above the maximum of 100000 sat/vB")]
    TooHigh(f64),
}

/// Errors returned by [`crate::build`].
///
/// Every variant aborts the whole build; no partially assembled PSBT is ever returned.
#[derive(Debug, PartialEq, Error)]
pub enum PsbtBuildError {
    #[error("at least one input is required")]
    NoInputs,

    #[error("at least one output is required")]
    NoOutputs,

    #[error("no inputs were added (all duplicates)")]
    AllInputsDuplicate,

    #[error("failed to add input {outpoint}: {source}")]
    InvalidInput {
        outpoint: String,
        #[source]
        source: InputError,
    },

    #[error("invalid output address {address}: {source}")]
    InvalidOutputAddress {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("invalid change address {address}: {source}")]
    InvalidChangeAddress {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("insufficient funds: need {shortfall} more satoshis")]
    InsufficientFunds { shortfall: u64 },

    #[error("an arithmetic overflow occurred while summing amounts")]
    AmountOverflow,

    #[error("failed to create the unsigned transaction: {0}")]
    Codec(String),
}

/// Errors returned when decoding a PSBT or raw transaction for display.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("nothing to decode")]
    Empty,

    #[error("invalid hex string: odd length")]
    OddLength,

    #[error("payload must start with 0x70 (PSBT) or 0x01/0x02 (raw transaction)")]
    UnrecognizedPayload,

    #[error("failed to parse PSBT: {0}")]
    Psbt(String),

    #[error("failed to parse transaction: {0}")]
    Transaction(String),
}
