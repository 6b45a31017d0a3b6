use console_psbt_builder::{build, BuildRequest, FeeRate, Output};

use crate::{
    error::{ServiceError, WalletError},
    selection::UtxoSelection,
    wallet::{SignPsbtOptions, WalletBridge},
};

/// An unsigned transaction ready to be handed to the wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedSend {
    pub psbt_hex: String,
    pub fee: u64,
    pub change_amount: u64,
    pub vsize: usize,
}

/// Spends a UTXO selection through the wallet: build, sign, broadcast.
///
/// Change always goes back to the wallet's first account.
pub struct SendFlow<'a, W> {
    wallet: &'a W,
}

impl<'a, W: WalletBridge> SendFlow<'a, W> {
    pub fn new(wallet: &'a W) -> Self {
        Self { wallet }
    }

    pub async fn prepare(
        &self,
        selection: &UtxoSelection,
        outputs: Vec<Output>,
        fee_rate: FeeRate,
    ) -> Result<PreparedSend, ServiceError> {
        if selection.is_empty() {
            return Err(ServiceError::EmptySelection);
        }

        let chain = self.wallet.get_chain().await?;
        let change_address = self
            .wallet
            .get_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(ServiceError::NoAccount)?;

        let request = BuildRequest {
            inputs: selection.to_inputs(),
            outputs,
            change_address,
            fee_rate,
            network: chain.network(),
        };
        let result = build(&request)?;

        tracing::info!(
            %chain,
            inputs = selection.len(),
            fee = result.fee,
            change = result.change_amount,
            "prepared send"
        );

        Ok(PreparedSend {
            psbt_hex: result.psbt_hex(),
            fee: result.fee,
            change_amount: result.change_amount,
            vsize: result.vsize,
        })
    }

    /// Asks the wallet to sign without finalizing, so the PSBT can still be pushed later.
    pub async fn sign(&self, prepared: &PreparedSend) -> Result<String, WalletError> {
        self.wallet
            .sign_psbt(
                &prepared.psbt_hex,
                SignPsbtOptions {
                    auto_finalized: false,
                },
            )
            .await
    }

    /// Pays `outputs` straight from the wallet, which does its own coin selection.
    pub async fn send_bitcoin(&self, outputs: &[Output]) -> Result<String, ServiceError> {
        if outputs.is_empty() {
            return Err(ServiceError::NoPayments);
        }

        if let Some(index) = outputs
            .iter()
            .position(|output| output.address.trim().is_empty() || output.amount == 0)
        {
            return Err(ServiceError::IncompletePayment(index));
        }

        let txid = self.wallet.send_bitcoin(outputs).await?;
        tracing::info!(txid, outputs = outputs.len(), "sent bitcoin through the wallet");
        Ok(txid)
    }

    /// Broadcasts a signed PSBT and returns the txid.
    pub async fn broadcast(&self, signed_psbt_hex: &str) -> Result<String, WalletError> {
        let txid = self.wallet.push_psbt(signed_psbt_hex).await?;
        tracing::info!(txid, "broadcast transaction");
        Ok(txid)
    }
}
