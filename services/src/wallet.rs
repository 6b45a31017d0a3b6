//! The browser wallet extension, as seen by the console.
//!
//! Key custody and signing stay inside the extension; this is only the request surface.

use async_trait::async_trait;
use console_psbt_builder::{ChainType, Output};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::WalletError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub confirmed: u64,
    pub unconfirmed: u64,
    pub total: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    #[default]
    #[serde(rename = "ecdsa")]
    Ecdsa,
    #[serde(rename = "bip322-simple")]
    Bip322Simple,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignPsbtOptions {
    /// Finalize inputs after signing.
    pub auto_finalized: bool,
}

impl Default for SignPsbtOptions {
    fn default() -> Self {
        Self {
            auto_finalized: true,
        }
    }
}

/// Notifications pushed by the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<String>),
    NetworkChanged(String),
    ChainChanged(ChainType),
}

#[async_trait]
pub trait WalletBridge: Send + Sync {
    /// Prompts the user to connect and returns the granted accounts.
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError>;

    async fn get_accounts(&self) -> Result<Vec<String>, WalletError>;

    /// Hex public key of the current account.
    async fn get_public_key(&self) -> Result<String, WalletError>;

    async fn get_version(&self) -> Result<String, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    async fn get_balance(&self) -> Result<Balance, WalletError>;

    /// Legacy network name (`livenet`, `testnet`).
    async fn get_network(&self) -> Result<String, WalletError>;

    async fn get_chain(&self) -> Result<ChainType, WalletError>;

    async fn sign_message(&self, message: &str, kind: MessageKind) -> Result<String, WalletError>;

    /// Signs a hex PSBT and returns the signed PSBT hex.
    async fn sign_psbt(
        &self,
        psbt_hex: &str,
        options: SignPsbtOptions,
    ) -> Result<String, WalletError>;

    async fn sign_psbts(
        &self,
        psbt_hexes: &[String],
        options: SignPsbtOptions,
    ) -> Result<Vec<String>, WalletError>;

    /// Extracts and broadcasts a signed PSBT, returning the txid.
    async fn push_psbt(&self, psbt_hex: &str) -> Result<String, WalletError>;

    async fn push_tx(&self, raw_tx_hex: &str) -> Result<String, WalletError>;

    /// Lets the wallet pick inputs, build, sign and broadcast a payment to `outputs`.
    /// Returns the txid.
    async fn send_bitcoin(&self, outputs: &[Output]) -> Result<String, WalletError>;

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}
