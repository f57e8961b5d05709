//! Log retrieval by walking blocks and transaction receipts
//!
//! Used when a node cannot serve filtered `eth_getLogs` queries. Every block
//! in the range is fetched, then the receipts of its transactions. Only
//! transactions sent from or to a tracked contract are kept, and only logs
//! emitted by a tracked contract are returned. Fetched blocks and receipts are
//! recorded in the [`ChainContext`] so normalization does not fetch them again.

use std::collections::HashSet;
use std::pin::pin;

use alloy_primitives::Address;
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info, Instrument};

use super::normalize::{ChainContext, Fanout};
use crate::config_types::ResolvedRange;
use crate::errors::RetrievalError;
use crate::rpc::{BlockRef, ChainRpc, RawLog, RetryingRpc, TxReceipt};
use crate::spans;

pub(crate) struct BlockScanner<'a, R: ?Sized> {
    rpc: &'a RetryingRpc<'a, R>,
    fanout: Fanout,
    tracked: HashSet<Address>,
}

impl<'a, R: ChainRpc + ?Sized> BlockScanner<'a, R> {
    pub fn new(
        rpc: &'a RetryingRpc<'a, R>,
        fanout: Fanout,
        tracked: impl IntoIterator<Item = Address>,
    ) -> Self {
        Self {
            rpc,
            fanout,
            tracked: tracked.into_iter().collect(),
        }
    }

    fn is_relevant(&self, receipt: &TxReceipt) -> bool {
        !receipt.logs.is_empty()
            && (self.tracked.contains(&receipt.from)
                || receipt.to.is_some_and(|to| self.tracked.contains(&to)))
    }

    /// Logs emitted by tracked contracts in relevant transactions, in block
    /// order and receipt order within a block
    pub async fn scan(
        &self,
        range: ResolvedRange,
        context: &mut ChainContext,
    ) -> Result<Vec<RawLog>, RetrievalError> {
        let span = spans::scan_blocks(range.from, range.to);
        self.scan_inner(range, context).instrument(span).await
    }

    async fn scan_inner(
        &self,
        range: ResolvedRange,
        context: &mut ChainContext,
    ) -> Result<Vec<RawLog>, RetrievalError> {
        info!(
            from_block = range.from,
            to_block = range.to,
            tracked = self.tracked.len(),
            "Starting block scan"
        );

        let rpc = self.rpc;
        let fanout = self.fanout;
        let mut blocks = pin!(stream::iter(range.from..=range.to)
            .map(|number| async move {
                fanout.pace().await;
                rpc.block(BlockRef::Number(number)).await
            })
            .buffered(fanout.blocks));

        let mut all_logs = Vec::new();

        while let Some(block) = blocks.try_next().await? {
            let receipts: Vec<TxReceipt> = stream::iter(block.transactions.iter().copied())
                .map(|tx_hash| async move {
                    fanout.pace().await;
                    rpc.transaction_receipt(tx_hash).await
                })
                .buffered(fanout.receipts)
                .try_collect()
                .await?;

            let mut kept = 0;
            for receipt in receipts.into_iter().filter(|r| self.is_relevant(r)) {
                all_logs.extend(
                    receipt
                        .logs
                        .iter()
                        .filter(|log| self.tracked.contains(&log.address))
                        .cloned(),
                );
                context.insert_receipt(receipt);
                kept += 1;
            }

            debug!(
                block_number = block.number,
                transactions = block.transactions.len(),
                kept,
                "Scanned block"
            );
            context.insert_block(block);
        }

        info!(total_logs = all_logs.len(), "Finished block scan");

        Ok(all_logs)
    }
}
