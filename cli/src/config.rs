use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bitcoin::Network;
use console_psbt_builder::{constants::DEFAULT_FEE_RATE, resolve_network, FeeRate};
use console_services::{
    indexer::{DEFAULT_INDEXER_URL, DEFAULT_ORDISCAN_URL},
    rate_limit, RateLimitConfig,
};
use serde::{Deserialize, Serialize};

pub const CONFIG_DIR_NAME: &str = "wallet-console";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Console settings, read from `config.toml`. Every key is optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Chain identifier as the wallet extension reports it.
    pub chain: String,
    /// sat/vB used when a command does not specify one.
    pub fee_rate: f64,
    /// Look up the spend status of every listed UTXO.
    pub fetch_status: bool,
    pub indexer: IndexerConfig,
    /// Ordinals-aware listing used by `utxos --ordiscan`.
    pub ordiscan: OrdiscanConfig,
    pub rate_limit: RateLimitSection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexerConfig {
    pub url: String,
    pub token: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrdiscanConfig {
    pub url: String,
    pub api_key: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitSection {
    pub max_calls: usize,
    pub window_secs: u64,
    pub max_tracked_addresses: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain: "BITCOIN_MAINNET".to_string(),
            fee_rate: DEFAULT_FEE_RATE,
            fetch_status: false,
            indexer: IndexerConfig::default(),
            ordiscan: OrdiscanConfig::default(),
            rate_limit: RateLimitSection::default(),
        }
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_INDEXER_URL.to_string(),
            token: None,
        }
    }
}

impl Default for OrdiscanConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ORDISCAN_URL.to_string(),
            api_key: None,
        }
    }
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            max_calls: rate_limit::DEFAULT_MAX_CALLS,
            window_secs: rate_limit::DEFAULT_WINDOW.as_secs(),
            max_tracked_addresses: rate_limit::DEFAULT_MAX_TRACKED_KEYS,
        }
    }
}

/// `$CONFIG_DIR/wallet-console/config.toml`, if the platform has a config directory.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl Config {
    /// Loads the config from `path`, or from [`default_path`] when `path` is `None`.
    ///
    /// A missing default file yields the defaults. An explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => match default_path() {
                Some(path) if path.exists() => Self::from_path(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn network(&self) -> Network {
        resolve_network(&self.chain)
    }

    pub fn fee_rate(&self) -> Result<FeeRate> {
        FeeRate::try_from(self.fee_rate).context("invalid fee_rate in config")
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_calls: self.rate_limit.max_calls,
            window: Duration::from_secs(self.rate_limit.window_secs),
            max_tracked_keys: self.rate_limit.max_tracked_addresses,
        }
    }
}
