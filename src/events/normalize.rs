//! Joining decoded events with their block and transaction context

use std::collections::HashMap;
use std::time::Duration;

use alloy_primitives::{Address, BlockHash, BlockNumber, TxHash};
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use tokio::time::sleep;
use tracing::debug;

use super::decoder::DecodedEvent;
use super::value::EventFields;
use crate::config::constants::UNLABELED;
use crate::contract::ContractDescriptor;
use crate::errors::{RetrievalError, RpcError, RpcOperation};
use crate::rpc::{BlockRef, BlockSummary, ChainRpc, RetryingRpc, TxReceipt};

/// A decoded event with block and transaction context attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedEvent {
    pub name: String,
    pub values: EventFields,
    pub block_number: BlockNumber,
    pub block_hash: BlockHash,
    pub tx_hash: TxHash,
    pub log_index: u64,
    /// Transaction sender
    pub sender: Address,
    /// Transaction recipient; `None` for contract creations
    pub recipient: Option<Address>,
    /// Block timestamp, seconds since the Unix epoch
    pub timestamp: u64,
    pub contract_label: String,
    pub contract_address: Address,
}

impl NormalizedEvent {
    pub fn block_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.timestamp).ok()?, 0)
    }
}

/// Attach block and receipt context to a decoded event
///
/// The contract label is the descriptor's name when the transaction was sent
/// directly to that contract, and `"n/a"` otherwise (internal calls, other
/// contracts, unnamed descriptors).
pub fn normalize(
    event: DecodedEvent,
    block: &BlockSummary,
    receipt: &TxReceipt,
    contract: &ContractDescriptor,
) -> NormalizedEvent {
    let contract_label = match (receipt.to, contract.name()) {
        (Some(to), Some(name)) if to == contract.address() => name.to_string(),
        _ => UNLABELED.to_string(),
    };

    NormalizedEvent {
        name: event.name,
        values: event.values,
        block_number: event.block_number,
        block_hash: event.block_hash,
        tx_hash: event.tx_hash,
        log_index: event.log_index,
        sender: receipt.from,
        recipient: receipt.to,
        timestamp: block.timestamp,
        contract_label,
        contract_address: contract.address(),
    }
}

/// Fan-out limits for block and receipt lookups
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fanout {
    pub blocks: usize,
    pub receipts: usize,
    pub request_delay: Option<Duration>,
}

impl Fanout {
    pub async fn pace(&self) {
        if let Some(delay) = self.request_delay {
            sleep(delay).await;
        }
    }
}

/// Blocks and receipts fetched during one harvest call
///
/// Each distinct block and receipt is fetched at most once per call.
#[derive(Debug, Default)]
pub(crate) struct ChainContext {
    blocks: HashMap<BlockHash, BlockSummary>,
    receipts: HashMap<TxHash, TxReceipt>,
}

impl ChainContext {
    pub fn insert_block(&mut self, block: BlockSummary) {
        self.blocks.insert(block.hash, block);
    }

    pub fn insert_receipt(&mut self, receipt: TxReceipt) {
        self.receipts.insert(receipt.transaction_hash, receipt);
    }

    /// Fetch whatever blocks and receipts the events need and are missing
    pub async fn fetch_missing<R: ChainRpc + ?Sized>(
        &mut self,
        rpc: &RetryingRpc<'_, R>,
        events: &[(DecodedEvent, &ContractDescriptor)],
        fanout: Fanout,
    ) -> Result<(), RetrievalError> {
        let mut block_hashes: Vec<BlockHash> = events
            .iter()
            .map(|(event, _)| event.block_hash)
            .filter(|hash| !self.blocks.contains_key(hash))
            .collect();
        block_hashes.sort_unstable();
        block_hashes.dedup();

        let mut tx_hashes: Vec<TxHash> = events
            .iter()
            .map(|(event, _)| event.tx_hash)
            .filter(|hash| !self.receipts.contains_key(hash))
            .collect();
        tx_hashes.sort_unstable();
        tx_hashes.dedup();

        debug!(
            blocks = block_hashes.len(),
            receipts = tx_hashes.len(),
            "Fetching event context"
        );

        let blocks: Vec<BlockSummary> = stream::iter(block_hashes)
            .map(|hash| async move {
                fanout.pace().await;
                rpc.block(BlockRef::Hash(hash)).await
            })
            .buffered(fanout.blocks)
            .try_collect()
            .await?;
        blocks.into_iter().for_each(|block| self.insert_block(block));

        let receipts: Vec<TxReceipt> = stream::iter(tx_hashes)
            .map(|hash| async move {
                fanout.pace().await;
                rpc.transaction_receipt(hash).await
            })
            .buffered(fanout.receipts)
            .try_collect()
            .await?;
        receipts
            .into_iter()
            .for_each(|receipt| self.insert_receipt(receipt));

        Ok(())
    }

    /// Normalize an event whose context has been fetched
    pub fn normalize(
        &self,
        event: DecodedEvent,
        contract: &ContractDescriptor,
    ) -> Result<NormalizedEvent, RetrievalError> {
        let block = self
            .blocks
            .get(&event.block_hash)
            .ok_or_else(|| missing(RpcOperation::Block(BlockRef::Hash(event.block_hash))))?;
        let receipt = self
            .receipts
            .get(&event.tx_hash)
            .ok_or_else(|| missing(RpcOperation::Receipt(event.tx_hash)))?;
        Ok(normalize(event, block, receipt, contract))
    }
}

fn missing(operation: RpcOperation) -> RetrievalError {
    let what = operation.to_string();
    RetrievalError {
        operation,
        attempts: 0,
        source: RpcError::not_found(what),
    }
}
