use console_psbt_builder::error::{FeeRateError, PsbtBuildError};
use thiserror::Error;

/// Failures talking to the UTXO indexer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IndexerError {
    #[error("request to indexer failed: {0}")]
    Transport(String),

    #[error("indexer returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The indexer answered but reported a failure in its envelope.
    #[error("indexer error: {0}")]
    Api(String),

    #[error("invalid JSON response from indexer: {0}")]
    InvalidJson(String),

    #[error("unrecognized response shape from indexer")]
    UnrecognizedResponseShape,

    #[error("indexer does not support {0}")]
    Unsupported(&'static str),
}

impl From<reqwest::Error> for IndexerError {
    fn from(e: reqwest::Error) -> Self {
        IndexerError::Transport(e.to_string())
    }
}

/// Failures reported by the wallet extension.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("wallet is not available")]
    Unavailable,

    #[error("request rejected by the user")]
    Rejected,

    #[error("wallet request failed: {0}")]
    Request(String),
}

#[derive(Debug, PartialEq, Error)]
pub enum ServiceError {
    #[error("an address is required")]
    MissingAddress,

    #[error("invalid bitcoin address: {0}")]
    InvalidAddress(String),

    #[error("rate limit reached, retry in {retry_after_secs} second(s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("utxos for {0} are already being loaded")]
    AlreadyLoading(String),

    #[error("no utxo at index {0}")]
    UnknownUtxo(usize),

    #[error("no utxos selected")]
    EmptySelection,

    #[error("at least one payment is required")]
    NoPayments,

    #[error("payment {0} needs an address and a non-zero amount")]
    IncompletePayment(usize),

    #[error("wallet returned no accounts")]
    NoAccount,

    #[error(transparent)]
    FeeRate(#[from] FeeRateError),

    #[error(transparent)]
    Build(#[from] PsbtBuildError),

    #[error(transparent)]
    Indexer(#[from] IndexerError),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}
