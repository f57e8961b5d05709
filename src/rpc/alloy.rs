// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! [`ChainRpc`] backed by an alloy provider

use alloy_json_rpc::RpcError as JsonRpcError;
use alloy_primitives::{Address, BlockNumber, Bytes, TxHash};
use alloy_provider::Provider;
use alloy_rpc_types::{BlockNumberOrTag, Filter, Log, Topic};
use alloy_transport::TransportError;
use async_trait::async_trait;

use super::{BlockRef, BlockSummary, ChainRpc, RawLog, TxReceipt};
use crate::errors::RpcError;
use crate::events::LogFilter;

/// Adapter from an alloy [`Provider`] to [`ChainRpc`]
///
/// # Example
///
/// ```rust,ignore
/// use eventharvest::{AlloyRpc, provider::{create_http_provider, ProviderConfig}};
///
/// let provider = create_http_provider(ProviderConfig::new("https://eth.llamarpc.com"))?;
/// let rpc = AlloyRpc::new(provider);
/// ```
#[derive(Debug, Clone)]
pub struct AlloyRpc<P> {
    provider: P,
}

impl<P> AlloyRpc<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P> ChainRpc for AlloyRpc<P>
where
    P: Provider + Send + Sync,
{
    async fn block_number(&self) -> Result<BlockNumber, RpcError> {
        self.provider
            .get_block_number()
            .await
            .map_err(transport_error)
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcError> {
        let logs = self
            .provider
            .get_logs(&to_rpc_filter(filter))
            .await
            .map_err(transport_error)?;
        logs.into_iter().map(raw_log).collect()
    }

    async fn block(&self, block: BlockRef) -> Result<BlockSummary, RpcError> {
        let response = match block {
            BlockRef::Number(n) => {
                self.provider
                    .get_block_by_number(BlockNumberOrTag::Number(n))
                    .await
            }
            BlockRef::Hash(hash) => self.provider.get_block_by_hash(hash).await,
        }
        .map_err(transport_error)?
        .ok_or_else(|| RpcError::not_found(block.to_string()))?;

        Ok(BlockSummary {
            number: response.header.number,
            hash: response.header.hash,
            timestamp: response.header.timestamp,
            transactions: response.transactions.hashes().collect(),
        })
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, RpcError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(transport_error)?
            .ok_or_else(|| RpcError::not_found(format!("receipt for {tx_hash}")))?;

        let block_number = receipt
            .block_number
            .ok_or_else(|| RpcError::malformed(format!("receipt for {tx_hash} has no block")))?;
        let logs = receipt
            .inner
            .logs()
            .iter()
            .cloned()
            .map(raw_log)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TxReceipt {
            transaction_hash: receipt.transaction_hash,
            from: receipt.from,
            to: receipt.to,
            block_number,
            logs,
        })
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, RpcError> {
        self.provider
            .get_code_at(address)
            .await
            .map_err(transport_error)
    }
}

/// Wire filter for a [`LogFilter`]; empty topic sets are wildcards.
pub(crate) fn to_rpc_filter(filter: &LogFilter) -> Filter {
    let mut rpc = Filter::new().address(filter.addresses.clone());
    if let Some(from) = filter.from_block {
        rpc = rpc.from_block(from);
    }
    if let Some(to) = filter.to_block {
        rpc = rpc.to_block(to);
    }
    for (slot, topic) in rpc.topics.iter_mut().zip(&filter.topics) {
        *slot = Topic::from(topic.values());
    }
    rpc
}

fn raw_log(log: Log) -> Result<RawLog, RpcError> {
    let missing = |field: &str| RpcError::malformed(format!("log is missing {field}"));

    Ok(RawLog {
        address: log.address(),
        topics: log.topics().to_vec(),
        data: log.data().data.clone(),
        block_hash: log.block_hash.ok_or_else(|| missing("blockHash"))?,
        block_number: log.block_number.ok_or_else(|| missing("blockNumber"))?,
        transaction_hash: log
            .transaction_hash
            .ok_or_else(|| missing("transactionHash"))?,
        log_index: log.log_index.ok_or_else(|| missing("logIndex"))?,
    })
}

fn transport_error(error: TransportError) -> RpcError {
    let retryable = is_retryable_transport_error(&error);
    RpcError::transport(retryable, error)
}

/// Whether a transport error is worth another attempt
pub fn is_retryable_transport_error(error: &TransportError) -> bool {
    match error {
        // Transport errors carry their own classification (429, 5xx, dropped connections)
        JsonRpcError::Transport(kind) => kind.is_retry_err(),

        // Serialization errors indicate a malformed request
        JsonRpcError::SerError(_) => false,

        // A garbled response may be transient
        JsonRpcError::DeserError { .. } => true,

        JsonRpcError::ErrorResp(err) => err.is_retry_err(),

        JsonRpcError::NullResp => true,

        _ => false,
    }
}
