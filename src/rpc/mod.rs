// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! RPC retrieval layer
//!
//! [`ChainRpc`] is the seam between the engine and a JSON-RPC node. It
//! exposes exactly the calls the engine suspends on, returning the crate's
//! own wire types so the rest of the pipeline does not depend on a
//! particular client.
//!
//! - [`AlloyRpc`] implements it for any alloy [`Provider`](alloy_provider::Provider)
//! - [`RetryingRpc`] wraps any implementation with timeouts and bounded
//!   retries, turning exhausted calls into [`RetrievalError`](crate::RetrievalError)

use std::fmt;

use alloy_primitives::{Address, BlockHash, BlockNumber, Bytes, TxHash, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::RpcError;
use crate::events::LogFilter;

mod alloy;
mod retry;

pub use alloy::{is_retryable_transport_error, AlloyRpc};
pub use retry::{calculate_backoff, Backoff, RetryPolicy, RetryingRpc};

/// A log as returned by `eth_getLogs` or inside a receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_hash: BlockHash,
    pub block_number: BlockNumber,
    pub transaction_hash: TxHash,
    pub log_index: u64,
}

/// The parts of a block the engine reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub number: BlockNumber,
    pub hash: BlockHash,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
    pub transactions: Vec<TxHash>,
}

/// The parts of a transaction receipt the engine reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub from: Address,
    /// `None` for contract creations
    pub to: Option<Address>,
    pub block_number: BlockNumber,
    pub logs: Vec<RawLog>,
}

/// Block lookup key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockRef {
    Number(BlockNumber),
    Hash(BlockHash),
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "block {n}"),
            Self::Hash(h) => write!(f, "block {h}"),
        }
    }
}

/// The JSON-RPC calls the engine relies on
///
/// Implementations report a single attempt's outcome; retrying, pacing and
/// timeouts are handled by [`RetryingRpc`]. A block or receipt the node does
/// not have yet should be reported as [`RpcError::NotFound`].
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// `eth_blockNumber`
    async fn block_number(&self) -> Result<BlockNumber, RpcError>;

    /// `eth_getLogs` for a filter with both bounds set
    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcError>;

    /// `eth_getBlockByNumber` / `eth_getBlockByHash`, transaction hashes only
    async fn block(&self, block: BlockRef) -> Result<BlockSummary, RpcError>;

    /// `eth_getTransactionReceipt`
    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, RpcError>;

    /// `eth_getCode` at the latest block
    async fn code_at(&self, address: Address) -> Result<Bytes, RpcError>;
}

#[async_trait]
impl<T: ChainRpc + ?Sized> ChainRpc for &T {
    async fn block_number(&self) -> Result<BlockNumber, RpcError> {
        (**self).block_number().await
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcError> {
        (**self).logs(filter).await
    }

    async fn block(&self, block: BlockRef) -> Result<BlockSummary, RpcError> {
        (**self).block(block).await
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, RpcError> {
        (**self).transaction_receipt(tx_hash).await
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, RpcError> {
        (**self).code_at(address).await
    }
}

#[async_trait]
impl<T: ChainRpc + ?Sized> ChainRpc for std::sync::Arc<T> {
    async fn block_number(&self) -> Result<BlockNumber, RpcError> {
        (**self).block_number().await
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcError> {
        (**self).logs(filter).await
    }

    async fn block(&self, block: BlockRef) -> Result<BlockSummary, RpcError> {
        (**self).block(block).await
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, RpcError> {
        (**self).transaction_receipt(tx_hash).await
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, RpcError> {
        (**self).code_at(address).await
    }
}
