use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};

use super::{parse_status_response, parse_utxo_response, IndexerApi, IndexerUtxo, UtxoStatus};
use crate::error::IndexerError;

pub const DEFAULT_INDEXER_URL: &str = "https://sdk.txspam.lol";

const SECRET_HEADER: &str = "X-Custom-Secret";

/// Indexer client speaking the market API over HTTPS.
#[derive(Clone, Debug)]
pub struct HttpIndexer {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpIndexer {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let token = token.filter(|token| !token.trim().is_empty());

        match &token {
            Some(token) => tracing::debug!(
                token_prefix = %token.chars().take(4).collect::<String>(),
                "using indexer secret token"
            ),
            None => tracing::warn!("no indexer secret token configured, requests may be rejected"),
        }

        Self {
            base_url,
            token,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn utxos_url(&self) -> String {
        format!("{}/market/v1/brc20/utxos", self.base_url)
    }

    fn status_url(&self, txid: &str, vout: u32) -> String {
        format!("{}/market/v1/brc20/utxos/{txid}/{vout}/status", self.base_url)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        if let Some(token) = &self.token {
            match HeaderValue::from_str(token) {
                Ok(value) => {
                    headers.insert(SECRET_HEADER, value);
                }
                Err(_) => tracing::warn!("indexer token is not a valid header value, skipping it"),
            }
        }

        headers
    }

    async fn post(&self, url: String, address: &str) -> Result<Value, IndexerError> {
        tracing::debug!(%url, address, "querying indexer");

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&json!({ "address": address.trim() }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::Http {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| IndexerError::InvalidJson(e.to_string()))
    }
}

/// Pulls `error` or `message` out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    ["error", "message"]
        .into_iter()
        .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
}

#[async_trait]
impl IndexerApi for HttpIndexer {
    async fn utxos(&self, address: &str) -> Result<Vec<IndexerUtxo>, IndexerError> {
        let body = self.post(self.utxos_url(), address).await?;
        parse_utxo_response(body, address.trim())
    }

    async fn utxo_status(
        &self,
        txid: &str,
        vout: u32,
        address: &str,
    ) -> Result<UtxoStatus, IndexerError> {
        let body = self.post(self.status_url(txid, vout), address).await?;
        parse_status_response(body, txid, vout)
    }
}
