use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde_json::Value;

use super::{parse_ordiscan_response, IndexerApi, IndexerUtxo, UtxoStatus};
use crate::error::IndexerError;

pub const DEFAULT_ORDISCAN_URL: &str = "https://api.ordiscan.com";

const MISSING_KEY_MESSAGE: &str = "API key required. Please configure your ordiscan.com API key.";

/// Ordinals-aware listing from ordiscan.com. Entries carry their inscriptions and runes,
/// which is what keeps asset-bearing outputs out of the spendable bucket.
#[derive(Clone, Debug)]
pub struct OrdiscanIndexer {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OrdiscanIndexer {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let api_key = api_key.into().trim().to_string();

        tracing::debug!(
            key_prefix = %api_key.chars().take(4).collect::<String>(),
            "using ordiscan api key"
        );

        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn utxos_url(&self, address: &str) -> String {
        format!("{}/v1/address/{address}/utxos", self.base_url)
    }
}

fn status_error(status: StatusCode) -> IndexerError {
    let message = if status == StatusCode::UNAUTHORIZED {
        MISSING_KEY_MESSAGE.to_string()
    } else {
        status.to_string()
    };

    IndexerError::Http {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl IndexerApi for OrdiscanIndexer {
    async fn utxos(&self, address: &str) -> Result<Vec<IndexerUtxo>, IndexerError> {
        let address = address.trim();
        let url = self.utxos_url(address);
        tracing::debug!(%url, "querying ordiscan");

        let response = self
            .client
            .get(&url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| IndexerError::InvalidJson(e.to_string()))?;

        parse_ordiscan_response(body, address)
    }

    async fn utxo_status(
        &self,
        _txid: &str,
        _vout: u32,
        _address: &str,
    ) -> Result<UtxoStatus, IndexerError> {
        Err(IndexerError::Unsupported("utxo status lookups"))
    }
}
