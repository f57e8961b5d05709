// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Harvest, decode and normalize historical smart-contract event logs from
//! EVM JSON-RPC nodes.
//!
//! Given contract descriptors (address plus ABI), an event selection and a
//! block range, [`harvest`] batches `eth_getLogs` requests within provider
//! limits, retries transient failures with backoff, decodes every log against
//! the contract's ABI and attaches block timestamp, sender and recipient.
//!
//! ```rust,ignore
//! use eventharvest::{harvest_endpoint, ContractDescriptor, HarvestConfig, HarvestRequest};
//!
//! let usdc = ContractDescriptor::from_abi_json(address, &abi_json)?
//!     .named("USDC")
//!     .deployed_at(6_082_465);
//! let request = HarvestRequest::new().from_block(19_000_000).event("Transfer");
//! let events = harvest_endpoint(rpc_url, &[usdc], &HarvestConfig::default(), &request).await?;
//! ```

pub mod bootstrap;
pub mod config;
pub mod config_types;
pub mod contract;
pub mod errors;
pub mod events;
pub mod harvest;
pub mod provider;
pub mod rpc;
mod spans;
pub mod transport;

pub use config::{
    ChainConfig, HarvestConfig, HarvestConfigBuilder, RangePolicy, RetrievalMode, ScanSettings,
};
pub use config_types::{BlockTarget, MaxBlockRange, ResolvedRange};
pub use contract::{ContractDescriptor, EventInput, EventSpec};
pub use errors::{
    ContractError, DecodeError, EncodingError, FilterError, HarvestError, RangeError,
    RetrievalError, RpcError, RpcOperation,
};
pub use events::{
    build_filter, decode_log, encode_indexed_value, normalize, signature_topic, topic_matches,
    Decoded, DecodedEvent, EventFields, EventValue, ExcludedEvents, IndexedArg, IndexedArgs,
    LogDecoder, LogFilter, NormalizedEvent, TopicFilter,
};
pub use harvest::{harvest, harvest_endpoint, HarvestRequest, Harvester};
pub use rpc::{
    AlloyRpc, Backoff, BlockRef, BlockSummary, ChainRpc, RawLog, RetryPolicy, RetryingRpc,
    TxReceipt,
};
