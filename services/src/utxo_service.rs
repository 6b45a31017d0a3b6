use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Mutex;

use bitcoin::{address::NetworkUnchecked, Address};
use futures::future::join_all;

use crate::{
    error::ServiceError,
    indexer::{IndexerApi, UtxoStatus},
    rate_limit::RateLimiter,
    status::UtxoWithStatus,
};

/// Status lookups issued concurrently per batch.
pub const STATUS_BATCH_SIZE: usize = 10;

/// Fetches UTXO listings through an [`IndexerApi`], rate limited per address, with at
/// most one fetch in flight per address.
pub struct UtxoService<I> {
    indexer: I,
    limiter: RateLimiter,
    fetch_status: bool,
    loading: Mutex<HashSet<String>>,
}

/// Marks an address as loading until dropped.
struct LoadingGuard<'a> {
    loading: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.loading
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .remove(&self.key);
    }
}

impl<I: IndexerApi> UtxoService<I> {
    pub fn new(indexer: I, limiter: RateLimiter, fetch_status: bool) -> Self {
        Self {
            indexer,
            limiter,
            fetch_status,
            loading: Mutex::new(HashSet::new()),
        }
    }

    pub fn indexer(&self) -> &I {
        &self.indexer
    }

    fn begin_loading(&self, address: &str) -> Result<LoadingGuard<'_>, ServiceError> {
        let key = address.to_lowercase();
        let mut loading = self.loading.lock().unwrap_or_else(|err| err.into_inner());

        if !loading.insert(key.clone()) {
            return Err(ServiceError::AlreadyLoading(address.to_string()));
        }

        Ok(LoadingGuard {
            loading: &self.loading,
            key,
        })
    }

    /// Lists the UTXOs of `address`, with their statuses when status fetching is on.
    ///
    /// A status lookup that fails is logged and leaves that UTXO's status unset; only a
    /// failure of the listing itself fails the call.
    pub async fn fetch_utxos(&self, address: &str) -> Result<Vec<UtxoWithStatus>, ServiceError> {
        let address = address.trim();

        if address.is_empty() {
            return Err(ServiceError::MissingAddress);
        }

        Address::<NetworkUnchecked>::from_str(address)
            .map_err(|_| ServiceError::InvalidAddress(address.to_string()))?;

        self.limiter
            .check(address)
            .map_err(|limited| ServiceError::RateLimited {
                retry_after_secs: limited.retry_after_secs(),
            })?;

        let _guard = self.begin_loading(address)?;

        let listed = self.indexer.utxos(address).await?;
        tracing::info!(address, count = listed.len(), "fetched utxos");

        let mut utxos: Vec<UtxoWithStatus> = listed.into_iter().map(UtxoWithStatus::new).collect();

        if self.fetch_status {
            for batch in utxos.chunks_mut(STATUS_BATCH_SIZE) {
                let statuses = join_all(
                    batch
                        .iter()
                        .map(|utxo| self.lookup_status(&utxo.utxo.txid, utxo.utxo.vout, address)),
                )
                .await;

                for (utxo, status) in batch.iter_mut().zip(statuses) {
                    utxo.status = status;
                }
            }
        }

        Ok(utxos)
    }

    async fn lookup_status(&self, txid: &str, vout: u32, address: &str) -> Option<UtxoStatus> {
        match self.indexer.utxo_status(txid, vout, address).await {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::warn!(txid, vout, error = %e, "failed to fetch utxo status");
                None
            }
        }
    }

    /// Re-queries the status of `utxos[index]` in place.
    pub async fn refresh_status(
        &self,
        utxos: &mut [UtxoWithStatus],
        index: usize,
    ) -> Result<(), ServiceError> {
        let utxo = utxos.get_mut(index).ok_or(ServiceError::UnknownUtxo(index))?;

        let status = self
            .indexer
            .utxo_status(&utxo.utxo.txid, utxo.utxo.vout, &utxo.utxo.address)
            .await?;
        utxo.status = Some(status);

        Ok(())
    }
}
