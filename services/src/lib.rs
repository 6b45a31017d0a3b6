//! Everything around the PSBT builder that talks to the outside world: the UTXO indexer,
//! the wallet extension, and the small amount of bookkeeping in between.
//!
//! - [`indexer`]: the [`IndexerApi`] trait, the market and ordiscan clients, and response
//!   decoding
//! - [`utxo_service`]: rate-limited, de-duplicated UTXO fetches with optional status lookups
//! - [`status`]: sorting UTXOs into spendable, locked and spent
//! - [`selection`]: the set of UTXOs picked for spending
//! - [`wallet`] and [`send`]: the wallet extension interface and the build, sign and
//!   broadcast flow on top of it
//!
//! Nothing here holds global state; the rate limiter and in-flight guards live in the
//! [`UtxoService`] the caller constructs.

pub mod error;
pub mod indexer;
pub mod rate_limit;
pub mod selection;
pub mod send;
mod serde;
pub mod status;
pub mod utxo_service;
pub mod wallet;

pub use error::{IndexerError, ServiceError, WalletError};
pub use indexer::{
    HttpIndexer, IndexerApi, IndexerUtxo, OrdiscanIndexer, RuneBalance, StatusKind, UtxoStatus,
};
pub use rate_limit::{RateLimitConfig, RateLimited, RateLimiter};
pub use selection::{SelectedUtxo, UtxoSelection};
pub use send::{PreparedSend, SendFlow};
pub use status::{partition, UtxoBuckets, UtxoWithStatus};
pub use utxo_service::UtxoService;
pub use wallet::{Balance, MessageKind, SignPsbtOptions, WalletBridge, WalletEvent};
