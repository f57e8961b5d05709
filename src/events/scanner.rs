// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Range batching for `eth_getLogs`
//!
//! Nodes cap the number of blocks (or results) a single `eth_getLogs` call
//! may cover. [`LogScanner`] splits a resolved range into sub-ranges no wider
//! than the configured [`MaxBlockRange`](crate::MaxBlockRange), requests them
//! one after another in ascending order and concatenates the results.
//!
//! A sub-range that still fails after its retries aborts the scan; the error
//! names the failed sub-range and no partial results are returned.
//!
//! # Examples
//!
//! ```rust,ignore
//! use eventharvest::events::scanner::LogScanner;
//!
//! let scanner = LogScanner::new(&rpc, config.settings(Some(chain)));
//! let logs = scanner.scan(&filter, ResolvedRange { from: 0, to: 12_000 }).await?;
//! ```

use tokio::time::sleep;
use tracing::{debug, info, Instrument};

use super::filter::LogFilter;
use crate::config::ScanSettings;
use crate::config_types::ResolvedRange;
use crate::errors::RetrievalError;
use crate::rpc::{ChainRpc, RawLog, RetryingRpc};
use crate::spans;

/// Sequential, rate-limited `eth_getLogs` over batched sub-ranges
pub struct LogScanner<'a, R: ?Sized> {
    rpc: &'a RetryingRpc<'a, R>,
    settings: ScanSettings,
    batching: bool,
}

impl<'a, R: ChainRpc + ?Sized> LogScanner<'a, R> {
    pub fn new(rpc: &'a RetryingRpc<'a, R>, settings: ScanSettings) -> Self {
        Self {
            rpc,
            settings,
            batching: true,
        }
    }

    /// Disable splitting; the whole range is requested in one call
    pub fn with_batching(mut self, batching: bool) -> Self {
        self.batching = batching;
        self
    }

    /// Retrieve every log matching `template` within `range`
    ///
    /// The template's own block bounds are replaced per sub-range. Results
    /// are in sub-range order, and within a sub-range in the order the node
    /// returned them.
    pub async fn scan(
        &self,
        template: &LogFilter,
        range: ResolvedRange,
    ) -> Result<Vec<RawLog>, RetrievalError> {
        let span = spans::scan_logs(range.from, range.to, self.settings.max_block_range.as_u64());
        self.scan_inner(template, range).instrument(span).await
    }

    async fn scan_inner(
        &self,
        template: &LogFilter,
        range: ResolvedRange,
    ) -> Result<Vec<RawLog>, RetrievalError> {
        let max_block_range = self.settings.max_block_range;
        let sub_ranges: Vec<(u64, u64)> = if self.batching {
            max_block_range.sub_ranges(range.from, range.to).collect()
        } else {
            vec![(range.from, range.to)]
        };

        info!(
            from_block = range.from,
            to_block = range.to,
            sub_ranges = sub_ranges.len(),
            %max_block_range,
            "Starting log scan"
        );

        let mut all_logs = Vec::new();
        let last = sub_ranges.len().saturating_sub(1);

        for (i, (from, to)) in sub_ranges.into_iter().enumerate() {
            let filter = template.clone().with_range(from, to);

            debug!(from_block = from, to_block = to, "Fetching logs for sub-range");
            let logs = self.rpc.logs(&filter).await?;
            debug!(
                logs_count = logs.len(),
                from_block = from,
                to_block = to,
                "Fetched logs for sub-range"
            );
            all_logs.extend(logs);

            if let Some(delay) = self.settings.rate_limit_delay {
                if i < last {
                    debug!(delay_ms = delay.as_millis() as u64, "Applying rate limit delay");
                    sleep(delay).await;
                }
            }
        }

        info!(total_logs = all_logs.len(), "Finished log scan");

        Ok(all_logs)
    }
}
