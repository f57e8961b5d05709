//! Command-line entry point.
//!
//! Reads a contract manifest, harvests the requested events and prints one
//! JSON object per event on stdout. Logs go to stderr.
//!
//! The manifest is a JSON list of contracts:
//!
//! ```json
//! [
//!   { "name": "USDC", "address": "0xa0b8...eb48", "abi_path": "abis/usdc.json", "start_block": 6082465 }
//! ]
//! ```
//!
//! `abi_path` is resolved relative to the manifest file.

use std::io::Write;
use std::path::{Path, PathBuf};

use alloy_chains::NamedChain;
use alloy_primitives::Address;
use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use serde::Deserialize;
use tracing::info;

use crate::config::{HarvestConfigBuilder, RangePolicy, RetrievalMode};
use crate::config_types::BlockTarget;
use crate::contract::ContractDescriptor;
use crate::errors::ContractError;
use crate::harvest::{HarvestRequest, Harvester};
use crate::provider::{create_http_provider, ProviderConfig};
use crate::rpc::AlloyRpc;

/// Harvest decoded smart-contract events from an EVM JSON-RPC node
#[derive(Debug, Parser)]
#[command(name = "eventharvest", version, about)]
pub struct Cli {
    /// JSON-RPC endpoint
    #[arg(long, env = "HARVEST_RPC_URL")]
    pub rpc_url: String,

    /// Contract manifest (JSON list of {name?, address, abi_path, start_block?})
    #[arg(long, env = "HARVEST_CONTRACTS")]
    pub contracts: PathBuf,

    /// First block; defaults to the earliest contract deployment block
    #[arg(long)]
    pub from_block: Option<u64>,

    /// Last block, or "latest"
    #[arg(long, default_value = "latest")]
    pub to_block: BlockTarget,

    /// Event to harvest (repeatable); all events when omitted
    #[arg(long = "event")]
    pub events: Vec<String>,

    /// Indexed argument of the first event, as name=value (repeatable)
    #[arg(long = "arg", value_parser = parse_arg)]
    pub args: Vec<(String, String)>,

    /// Event to drop from the output (repeatable)
    #[arg(long = "exclude")]
    pub excluded: Vec<String>,

    /// Widest block range per eth_getLogs request
    #[arg(long)]
    pub max_block_range: Option<u64>,

    /// Walk blocks and receipts instead of calling eth_getLogs
    #[arg(long)]
    pub block_scan: bool,

    /// Replace an invalid range with [deployment block, head] instead of failing
    #[arg(long)]
    pub fallback_to_deployment: bool,

    /// Chain ID, for chain-specific limits
    #[arg(long, env = "HARVEST_CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// Maximum requests per second sent to the endpoint
    #[arg(long)]
    pub rate_limit: Option<u32>,

    /// Check that each contract has code deployed before harvesting
    #[arg(long)]
    pub verify: bool,
}

fn parse_arg(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))?;
    if name.is_empty() {
        return Err(format!("missing argument name in {raw:?}"));
    }
    Ok((name.to_string(), value.to_string()))
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    name: Option<String>,
    address: Address,
    abi_path: PathBuf,
    start_block: Option<u64>,
}

async fn read(path: &Path) -> Result<String, ContractError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ContractError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Load contract descriptors from a manifest file
pub async fn load_manifest(path: &Path) -> Result<Vec<ContractDescriptor>, ContractError> {
    let entries: Vec<ManifestEntry> =
        serde_json::from_str(&read(path).await?).map_err(|source| ContractError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut contracts = Vec::with_capacity(entries.len());
    for entry in entries {
        let abi = read(&base.join(&entry.abi_path)).await?;
        let mut contract = ContractDescriptor::from_abi_json(entry.address, &abi)?;
        if let Some(name) = entry.name {
            contract = contract.named(name);
        }
        if let Some(block) = entry.start_block {
            contract = contract.deployed_at(block);
        }
        contracts.push(contract);
    }
    Ok(contracts)
}

impl Cli {
    fn request(&self) -> HarvestRequest {
        let mut request = HarvestRequest::new()
            .to_block(self.to_block)
            .events(self.events.iter().cloned());
        if let Some(from) = self.from_block {
            request = request.from_block(from);
        }
        for (name, value) in &self.args {
            request = request.indexed_arg(name.clone(), value.clone());
        }
        for name in &self.excluded {
            request = request.exclude(name.clone());
        }
        request
    }
}

/// Main entry point for the application.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let contracts = load_manifest(&cli.contracts)
        .await
        .with_context(|| format!("loading {}", cli.contracts.display()))?;

    let mut config = HarvestConfigBuilder::with_defaults();
    if let Some(max) = cli.max_block_range {
        config = config.max_block_range(max);
    }
    if cli.block_scan {
        config = config.retrieval_mode(RetrievalMode::BlockScan);
    }
    if cli.fallback_to_deployment {
        config = config.range_policy(RangePolicy::FallbackToDeployment);
    }

    let mut provider_config = ProviderConfig::new(&cli.rpc_url);
    if let Some(rps) = cli.rate_limit {
        provider_config = provider_config.with_rate_limit(rps);
    }
    let provider = create_http_provider(provider_config)?;

    let mut harvester = Harvester::new(AlloyRpc::new(provider), config.build());
    if let Some(id) = cli.chain_id {
        let chain = NamedChain::try_from(id)
            .ok()
            .with_context(|| format!("unknown chain ID {id}"))?;
        harvester = harvester.with_chain(chain);
    }

    if cli.verify {
        for contract in &contracts {
            harvester.verify_deployment(contract).await?;
        }
    }

    let events = harvester.harvest(&contracts, &cli.request()).await?;
    info!(events = events.len(), contracts = contracts.len(), "Harvest complete");

    let mut out = std::io::stdout().lock();
    for event in &events {
        serde_json::to_writer(&mut out, event)?;
        writeln!(out)?;
    }
    out.flush()?;

    Ok(())
}
