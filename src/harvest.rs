// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Harvest entry point
//!
//! A harvest call reads the chain head once, resolves and validates the
//! requested range, builds one log filter per tracked contract, retrieves and
//! verifies the matching logs, decodes them and attaches block and
//! transaction context. Results are ordered by `(block_number, log_index)`.
//!
//! Calls are all-or-nothing: any error returns `Err` and no events. All
//! in-flight RPC work belongs to the returned future, so dropping it cancels
//! the whole call.
//!
//! # Example
//!
//! ```rust,ignore
//! use eventharvest::{ContractDescriptor, HarvestConfig, HarvestRequest, Harvester};
//!
//! let harvester = Harvester::new(rpc, HarvestConfig::default());
//! let request = HarvestRequest::new()
//!     .from_block(19_000_000)
//!     .event("Transfer")
//!     .indexed_arg("_to", "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
//!
//! for event in harvester.harvest(&[usdc], &request).await? {
//!     println!("{} {} {}", event.block_number, event.name, event.values);
//! }
//! ```

use std::collections::HashMap;

use alloy_chains::NamedChain;
use alloy_primitives::{Address, BlockNumber};
use tracing::{debug, info, warn, Instrument};

use crate::config::constants::DEFAULT_START_BLOCK;
use crate::config::{HarvestConfig, RangePolicy, RetrievalMode};
use crate::config_types::{BlockTarget, ResolvedRange};
use crate::contract::ContractDescriptor;
use crate::errors::{ContractError, FilterError, HarvestError, RangeError};
use crate::events::block_scan::BlockScanner;
use crate::events::normalize::{ChainContext, Fanout};
use crate::events::{
    build_filter, decode_log, Decoded, DecodedEvent, ExcludedEvents, IndexedArg, IndexedArgs,
    LogFilter, LogScanner, NormalizedEvent,
};
use crate::provider::{create_http_provider, ProviderConfig};
use crate::rpc::{AlloyRpc, ChainRpc, RawLog, RetryingRpc};
use crate::spans;

/// What to harvest
///
/// Defaults to every event of every contract from the earliest deployment
/// block to the chain head.
#[derive(Debug, Clone, Default)]
pub struct HarvestRequest {
    /// First block; defaults to the lowest `start_block` of the contracts
    pub from_block: Option<BlockNumber>,
    pub to_block: BlockTarget,
    /// Events to harvest; empty means every event
    pub event_names: Vec<String>,
    /// Constraints on the indexed inputs of the first named event
    pub indexed_args: IndexedArgs,
    /// Events dropped after retrieval
    pub excluded_events: ExcludedEvents,
}

impl HarvestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_block(mut self, block: BlockNumber) -> Self {
        self.from_block = Some(block);
        self
    }

    pub fn to_block(mut self, target: impl Into<BlockTarget>) -> Self {
        self.to_block = target.into();
        self
    }

    pub fn event(mut self, name: impl Into<String>) -> Self {
        self.event_names.push(name.into());
        self
    }

    pub fn events<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn indexed_arg(mut self, name: impl Into<String>, value: impl Into<IndexedArg>) -> Self {
        self.indexed_args.insert(name.into(), value.into());
        self
    }

    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.excluded_events.insert(name.into());
        self
    }
}

/// Harvests events through one RPC client with one configuration
#[derive(Debug, Clone)]
pub struct Harvester<R> {
    rpc: R,
    config: HarvestConfig,
    chain: Option<NamedChain>,
}

impl<R: ChainRpc> Harvester<R> {
    pub fn new(rpc: R, config: HarvestConfig) -> Self {
        Self {
            rpc,
            config,
            chain: None,
        }
    }

    /// Apply the chain's overrides from the configuration
    pub fn with_chain(mut self, chain: NamedChain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub async fn harvest(
        &self,
        contracts: &[ContractDescriptor],
        request: &HarvestRequest,
    ) -> Result<Vec<NormalizedEvent>, HarvestError> {
        let span = spans::harvest(self.chain, contracts.len(), request.event_names.len());
        run(&self.rpc, &self.config, self.chain, contracts, request)
            .instrument(span)
            .await
    }

    /// Check that contract code is deployed at the descriptor's address
    pub async fn verify_deployment(
        &self,
        contract: &ContractDescriptor,
    ) -> Result<(), HarvestError> {
        let settings = self.config.settings(self.chain);
        let rpc = RetryingRpc::new(&self.rpc, &self.config.retry, settings.rpc_timeout);
        let code = rpc
            .code_at(contract.address())
            .instrument(spans::verify_deployment(contract.address()))
            .await?;
        if code.is_empty() {
            return Err(ContractError::NoCode {
                address: contract.address(),
            }
            .into());
        }
        Ok(())
    }
}

/// Harvest events with an existing RPC client
pub async fn harvest<R: ChainRpc + ?Sized>(
    contracts: &[ContractDescriptor],
    rpc: &R,
    config: &HarvestConfig,
    request: &HarvestRequest,
) -> Result<Vec<NormalizedEvent>, HarvestError> {
    let span = spans::harvest(None, contracts.len(), request.event_names.len());
    run(rpc, config, None, contracts, request)
        .instrument(span)
        .await
}

/// Harvest events from a JSON-RPC HTTP endpoint
pub async fn harvest_endpoint(
    url: &str,
    contracts: &[ContractDescriptor],
    config: &HarvestConfig,
    request: &HarvestRequest,
) -> Result<Vec<NormalizedEvent>, HarvestError> {
    let provider = create_http_provider(ProviderConfig::new(url))?;
    harvest(contracts, &AlloyRpc::new(provider), config, request).await
}

/// Resolve the requested range against the head
///
/// Under [`RangePolicy::FallbackToDeployment`] an invalid range is replaced
/// by `[deployment block, head]`.
fn resolve_range(
    from: BlockNumber,
    to: BlockTarget,
    head: BlockNumber,
    deployment: BlockNumber,
    policy: RangePolicy,
) -> Result<ResolvedRange, RangeError> {
    match ResolvedRange::resolve(from, to, head) {
        Ok(range) => Ok(range),
        Err(err) if policy == RangePolicy::FallbackToDeployment => {
            let fallback = ResolvedRange {
                from: deployment.min(head),
                to: head,
            };
            warn!(error = %err, %fallback, "Invalid range, falling back to deployment range");
            Ok(fallback)
        }
        Err(err) => Err(err),
    }
}

/// A contract with the filter to harvest it with
struct Target<'a> {
    contract: &'a ContractDescriptor,
    filter: LogFilter,
}

fn plan<'a>(
    contracts: &'a [ContractDescriptor],
    request: &HarvestRequest,
    range: ResolvedRange,
) -> Result<Vec<Target<'a>>, FilterError> {
    let names = &request.event_names;

    if let Some(unknown) = names
        .iter()
        .find(|name| !contracts.iter().any(|c| c.knows_event(name)))
    {
        return Err(FilterError::UnknownEvent {
            name: unknown.clone(),
        });
    }

    let no_args = IndexedArgs::new();
    let mut targets = Vec::with_capacity(contracts.len());

    for contract in contracts {
        let known: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|name| contract.knows_event(name))
            .collect();

        if !names.is_empty() && known.is_empty() {
            debug!(contract = contract.label(), address = %contract.address(), "Contract declares none of the requested events, skipping");
            continue;
        }

        // Indexed values belong to the first requested event
        let args = match (known.first(), names.first()) {
            (Some(first), Some(requested)) if *first == requested.as_str() => &request.indexed_args,
            _ if names.is_empty() => &request.indexed_args,
            _ => &no_args,
        };

        targets.push(Target {
            contract,
            filter: build_filter(contract, Some(range), &known, args)?,
        });
    }

    Ok(targets)
}

/// Hand each address its own logs, in the order the addresses are given
///
/// A repeated address receives a copy of the same logs.
fn split_by_address(
    logs: Vec<RawLog>,
    addresses: impl IntoIterator<Item = Address>,
) -> Vec<Vec<RawLog>> {
    let addresses: Vec<Address> = addresses.into_iter().collect();
    let mut by_address: HashMap<Address, Vec<RawLog>> = HashMap::new();
    for log in logs {
        by_address.entry(log.address).or_default().push(log);
    }

    addresses
        .iter()
        .enumerate()
        .map(|(i, address)| {
            if addresses[i + 1..].contains(address) {
                by_address.get(address).cloned().unwrap_or_default()
            } else {
                by_address.remove(address).unwrap_or_default()
            }
        })
        .collect()
}

async fn run<R: ChainRpc + ?Sized>(
    rpc: &R,
    config: &HarvestConfig,
    chain: Option<NamedChain>,
    contracts: &[ContractDescriptor],
    request: &HarvestRequest,
) -> Result<Vec<NormalizedEvent>, HarvestError> {
    if contracts.is_empty() {
        return Ok(Vec::new());
    }

    let settings = config.settings(chain);
    let rpc = RetryingRpc::new(rpc, &config.retry, settings.rpc_timeout);
    let fanout = Fanout {
        blocks: config.block_concurrency.max(1),
        receipts: config.receipt_concurrency.max(1),
        request_delay: config.request_delay,
    };

    let deployment = contracts
        .iter()
        .map(ContractDescriptor::start_block)
        .min()
        .unwrap_or(DEFAULT_START_BLOCK);
    let from = request.from_block.unwrap_or(deployment);

    let head = rpc.block_number().await?;
    let range = resolve_range(from, request.to_block, head, deployment, config.range_policy)?;

    info!(
        from_block = range.from,
        to_block = range.to,
        head,
        mode = ?config.retrieval_mode,
        "Starting harvest"
    );

    let targets = plan(contracts, request, range)?;
    let mut context = ChainContext::default();

    let logs_by_target: Vec<Vec<RawLog>> = match config.retrieval_mode {
        RetrievalMode::Logs => {
            let scanner = LogScanner::new(&rpc, settings).with_batching(config.batching);
            let mut all = Vec::with_capacity(targets.len());
            for target in &targets {
                all.push(scanner.scan(&target.filter, range).await?);
            }
            all
        }
        RetrievalMode::BlockScan => {
            let scanner = BlockScanner::new(
                &rpc,
                fanout,
                targets.iter().map(|t| t.contract.address()),
            );
            let logs = scanner.scan(range, &mut context).await?;
            split_by_address(logs, targets.iter().map(|t| t.contract.address()))
        }
    };

    let mut decoded: Vec<(DecodedEvent, &ContractDescriptor)> = Vec::new();
    for (target, logs) in targets.iter().zip(logs_by_target) {
        let mut rejected = 0usize;
        for log in logs {
            if !target.filter.matches(&log) {
                rejected += 1;
                continue;
            }
            if let Decoded::Event(event) =
                decode_log(&log, target.contract, &request.excluded_events)?
            {
                decoded.push((event, target.contract));
            }
        }
        if rejected > 0 {
            debug!(
                contract = target.contract.label(),
                rejected, "Dropped logs that do not match the filter"
            );
        }
    }

    let normalize_span = spans::normalize_events(decoded.len());
    context
        .fetch_missing(&rpc, &decoded, fanout)
        .instrument(normalize_span.clone())
        .await?;
    let mut events = normalize_span.in_scope(|| {
        decoded
            .into_iter()
            .map(|(event, contract)| context.normalize(event, contract))
            .collect::<Result<Vec<_>, _>>()
    })?;

    events.sort_by_key(|event| (event.block_number, event.log_index));

    info!(total_events = events.len(), "Finished harvest");

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_policy_rejects_invalid_range() {
        let err = resolve_range(500, BlockTarget::Latest, 100, 1, RangePolicy::Strict).unwrap_err();
        assert_eq!(err, RangeError::FromBeyondHead { from: 500, head: 100 });
    }

    #[test]
    fn test_fallback_uses_deployment_block() {
        let range = resolve_range(
            500,
            BlockTarget::Number(50),
            100,
            20,
            RangePolicy::FallbackToDeployment,
        )
        .unwrap();
        assert_eq!(range, ResolvedRange { from: 20, to: 100 });

        // Deployment beyond the head collapses to the head
        let range = resolve_range(
            500,
            BlockTarget::Latest,
            100,
            300,
            RangePolicy::FallbackToDeployment,
        )
        .unwrap();
        assert_eq!(range, ResolvedRange { from: 100, to: 100 });
    }

    #[test]
    fn test_valid_range_ignores_policy() {
        let range = resolve_range(
            10,
            BlockTarget::Number(20),
            100,
            1,
            RangePolicy::FallbackToDeployment,
        )
        .unwrap();
        assert_eq!(range, ResolvedRange { from: 10, to: 20 });
    }

    fn log_at(address: Address, block_number: BlockNumber) -> RawLog {
        RawLog {
            address,
            topics: vec![],
            data: Default::default(),
            block_hash: Default::default(),
            block_number,
            transaction_hash: Default::default(),
            log_index: 0,
        }
    }

    #[test]
    fn test_split_by_address_gives_each_contract_its_share() {
        let usdc = Address::repeat_byte(0x01);
        let dai = Address::repeat_byte(0x02);
        let idle = Address::repeat_byte(0x03);
        let logs = vec![log_at(usdc, 1), log_at(dai, 2), log_at(usdc, 3)];

        let split = split_by_address(logs, [dai, usdc, idle]);

        assert_eq!(split.len(), 3);
        assert_eq!(split[0], vec![log_at(dai, 2)]);
        assert_eq!(split[1], vec![log_at(usdc, 1), log_at(usdc, 3)]);
        assert!(split[2].is_empty());
    }

    #[test]
    fn test_split_by_address_repeats_shared_address() {
        let usdc = Address::repeat_byte(0x01);
        let split = split_by_address(vec![log_at(usdc, 7)], [usdc, usdc]);
        assert_eq!(split, vec![vec![log_at(usdc, 7)], vec![log_at(usdc, 7)]]);
    }

    #[test]
    fn test_request_builder() {
        let request = HarvestRequest::new()
            .from_block(5)
            .to_block(BlockTarget::Number(9))
            .events(["Transfer", "Approval"])
            .indexed_arg("_to", "0x0000000000000000000000000000000000000001")
            .exclude("Approval");

        assert_eq!(request.from_block, Some(5));
        assert_eq!(request.to_block, BlockTarget::Number(9));
        assert_eq!(request.event_names, vec!["Transfer", "Approval"]);
        assert!(request.indexed_args.contains_key("_to"));
        assert!(request.excluded_events.contains("Approval"));
    }
}
