use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bitcoin::Network;
use clap::{Parser, Subcommand};
use console_psbt_builder::{
    build, decode, estimate_fee, input_calc::estimated_vsize, resolve_network, BuildRequest,
    ChainType, DecodedTransaction, FeeRate, Output, UtxoInput,
};
use console_services::{
    partition, HttpIndexer, OrdiscanIndexer, RateLimiter, UtxoBuckets, UtxoService,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;

pub mod config;

#[derive(Debug, Parser)]
#[clap(
    name = "wallet-console",
    about = "Build, inspect and fund Bitcoin PSBTs",
    version
)]
pub struct Opts {
    /// Path to the config file [default: $CONFIG_DIR/wallet-console/config.toml]
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log at debug level
    #[clap(short, long, global = true)]
    pub verbose: bool,
    /// Secret sent to the indexer; overrides `[indexer] token`
    #[clap(
        long,
        global = true,
        env = "WALLET_CONSOLE_INDEXER_TOKEN",
        hide_env_values = true
    )]
    pub indexer_token: Option<String>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(about = "Build an unsigned PSBT from a JSON request file")]
    Build {
        /// JSON file with `inputs`, `outputs` and `changeAddress`
        #[clap(long)]
        request: PathBuf,
        /// Chain identifier, e.g. BITCOIN_TESTNET
        #[clap(long)]
        chain: Option<String>,
        /// sat/vB
        #[clap(long)]
        fee_rate: Option<f64>,
    },
    #[clap(about = "Estimate the fee for a transaction shape")]
    Fee {
        #[clap(long)]
        inputs: usize,
        #[clap(long)]
        outputs: usize,
        #[clap(long)]
        fee_rate: Option<f64>,
    },
    #[clap(about = "Decode a PSBT or raw transaction (hex or base64)")]
    Decode {
        payload: String,
        #[clap(long)]
        chain: Option<String>,
    },
    #[clap(about = "List the UTXOs of an address, sorted by spendability")]
    Utxos {
        address: String,
        /// Look up the spend status of each UTXO
        #[clap(long, conflicts_with = "ordiscan")]
        status: bool,
        /// List through ordiscan.com, locking outputs that carry inscriptions or runes
        #[clap(long)]
        ordiscan: bool,
        /// ordiscan.com API key; overrides `[ordiscan] api_key`
        #[clap(long, env = "WALLET_CONSOLE_ORDISCAN_KEY", hide_env_values = true)]
        ordiscan_key: Option<String>,
    },
    #[clap(about = "Show the address parameters used for a chain identifier")]
    Network { id: String },
}

/// The JSON accepted by `build --request`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFile {
    pub inputs: Vec<UtxoInput>,
    pub outputs: Vec<Output>,
    pub change_address: String,
    #[serde(default)]
    pub fee_rate: Option<FeeRate>,
    #[serde(default)]
    pub chain: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutput {
    pub psbt_hex: String,
    pub psbt_base64: String,
    pub fee: u64,
    pub change_amount: u64,
    pub vsize: usize,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeOutput {
    pub inputs: usize,
    pub outputs: usize,
    pub vsize: usize,
    pub fee_rate: f64,
    pub fee: u64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkOutput {
    /// The canonical identifier, or `None` when it was not recognized.
    pub chain: Option<ChainType>,
    pub network: String,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoTotals {
    pub spendable: u64,
    pub locked: u64,
    pub spent: u64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxosOutput {
    pub address: String,
    #[serde(flatten)]
    pub buckets: UtxoBuckets,
    pub totals: UtxoTotals,
}

fn fee_rate_or(cli: Option<f64>, fallback: Option<FeeRate>, config: &Config) -> Result<FeeRate> {
    match (cli, fallback) {
        (Some(rate), _) => FeeRate::try_from(rate).context("invalid --fee-rate"),
        (None, Some(rate)) => Ok(rate),
        (None, None) => config.fee_rate(),
    }
}

fn network_or(cli: Option<&str>, fallback: Option<&str>, config: &Config) -> Network {
    cli.or(fallback)
        .map(resolve_network)
        .unwrap_or_else(|| config.network())
}

pub fn build_from_file(
    path: &Path,
    chain: Option<&str>,
    fee_rate: Option<f64>,
    config: &Config,
) -> Result<BuildOutput> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read request file {}", path.display()))?;
    let file: RequestFile = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse request file {}", path.display()))?;

    let request = BuildRequest {
        fee_rate: fee_rate_or(fee_rate, file.fee_rate, config)?,
        network: network_or(chain, file.chain.as_deref(), config),
        inputs: file.inputs,
        outputs: file.outputs,
        change_address: file.change_address,
    };

    let result = build(&request)?;

    Ok(BuildOutput {
        psbt_hex: result.psbt_hex(),
        psbt_base64: result.psbt_base64(),
        fee: result.fee,
        change_amount: result.change_amount,
        vsize: result.vsize,
    })
}

pub fn fee(inputs: usize, outputs: usize, fee_rate: Option<f64>, config: &Config) -> Result<FeeOutput> {
    let fee_rate = fee_rate_or(fee_rate, None, config)?;

    Ok(FeeOutput {
        inputs,
        outputs,
        vsize: estimated_vsize(inputs, outputs),
        fee_rate: fee_rate.sat_per_vbyte(),
        fee: estimate_fee(inputs, outputs, &fee_rate),
    })
}

pub fn decode_payload(payload: &str, chain: Option<&str>, config: &Config) -> Result<DecodedTransaction> {
    let network = network_or(chain, None, config);
    Ok(decode(payload, network)?)
}

pub fn network(id: &str) -> NetworkOutput {
    NetworkOutput {
        chain: ChainType::from_identifier(id),
        network: resolve_network(id).to_string(),
    }
}

/// Which indexer `utxos` lists from, with the credential given on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UtxoSource {
    Market { token: Option<String> },
    Ordiscan { api_key: Option<String> },
}

pub async fn utxos(
    address: &str,
    status: bool,
    config: &Config,
    source: UtxoSource,
) -> Result<UtxosOutput> {
    let limiter = RateLimiter::new(config.rate_limit());

    let listed = match source {
        UtxoSource::Market { token } => {
            let indexer = HttpIndexer::new(
                config.indexer.url.clone(),
                token.or_else(|| config.indexer.token.clone()),
            );
            UtxoService::new(indexer, limiter, status || config.fetch_status)
                .fetch_utxos(address)
                .await?
        }
        UtxoSource::Ordiscan { api_key } => {
            let api_key = api_key
                .or_else(|| config.ordiscan.api_key.clone())
                .filter(|key| !key.trim().is_empty())
                .context("an ordiscan.com API key is required (--ordiscan-key or [ordiscan] api_key)")?;
            let indexer = OrdiscanIndexer::new(config.ordiscan.url.clone(), api_key);
            // ordiscan has no status endpoint; its listing already carries the asset data.
            UtxoService::new(indexer, limiter, false)
                .fetch_utxos(address)
                .await?
        }
    };

    let buckets = partition(listed);
    let totals = UtxoTotals {
        spendable: buckets.spendable_total(),
        locked: buckets.locked_total(),
        spent: buckets.spent_total(),
    };

    Ok(UtxosOutput {
        address: address.trim().to_string(),
        buckets,
        totals,
    })
}

/// Logs go to stderr so command output on stdout stays machine readable.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::try_new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
    }
    .context("invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn entry(opts: Opts) -> Result<()> {
    let config = Config::load(opts.config.as_deref())?;

    match opts.command {
        Command::Build {
            request,
            chain,
            fee_rate,
        } => print_json(&build_from_file(
            &request,
            chain.as_deref(),
            fee_rate,
            &config,
        )?),
        Command::Fee {
            inputs,
            outputs,
            fee_rate,
        } => print_json(&fee(inputs, outputs, fee_rate, &config)?),
        Command::Decode { payload, chain } => {
            print_json(&decode_payload(&payload, chain.as_deref(), &config)?)
        }
        Command::Utxos {
            address,
            status,
            ordiscan,
            ordiscan_key,
        } => {
            let source = if ordiscan {
                UtxoSource::Ordiscan {
                    api_key: ordiscan_key,
                }
            } else {
                UtxoSource::Market {
                    token: opts.indexer_token,
                }
            };

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            let output = runtime.block_on(utxos(&address, status, &config, source))?;
            print_json(&output)
        }
        Command::Network { id } => print_json(&network(&id)),
    }
}
