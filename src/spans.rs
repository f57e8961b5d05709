//! Span creation helpers for harvest operations.
//!
//! Telemetry is kept apart from business logic: instead of `#[instrument]`
//! attributes, each instrumented operation has a span helper here and the
//! operation attaches it with [`tracing::Instrument`].
//!
//! Usage pattern:
//! ```rust,ignore
//! pub async fn my_operation(&self, param: Type) -> Result<T> {
//!     let span = spans::my_operation(param_value);
//!     self.my_operation_inner(param).instrument(span).await
//! }
//! ```

use alloy_chains::NamedChain;
use alloy_primitives::{Address, BlockNumber};
use tracing::{Level, Span};

/// Create span for a whole harvest call.
///
/// Parent: None (root span for this operation)
/// Children: scan_logs or scan_blocks, normalize_events
#[inline]
pub(crate) fn harvest(chain: Option<NamedChain>, contracts: usize, event_names: usize) -> Span {
    tracing::span!(
        Level::INFO,
        "eventharvest.harvest",
        chain_id = ?chain,
        contracts = contracts,
        event_names = event_names,
    )
}

/// Create span for batched `eth_getLogs` retrieval over one range.
///
/// Parent: harvest span
#[inline]
pub(crate) fn scan_logs(from_block: BlockNumber, to_block: BlockNumber, max_block_range: u64) -> Span {
    tracing::debug_span!(
        "eventharvest.scan_logs",
        from_block = from_block,
        to_block = to_block,
        max_block_range = max_block_range,
        block_count = to_block.saturating_sub(from_block) + 1,
    )
}

/// Create span for walking blocks and receipts.
///
/// Parent: harvest span
#[inline]
pub(crate) fn scan_blocks(from_block: BlockNumber, to_block: BlockNumber) -> Span {
    tracing::debug_span!(
        "eventharvest.scan_blocks",
        from_block = from_block,
        to_block = to_block,
        block_count = to_block.saturating_sub(from_block) + 1,
    )
}

/// Create span for fetching context and normalizing decoded events.
///
/// Parent: harvest span
#[inline]
pub(crate) fn normalize_events(events: usize) -> Span {
    tracing::debug_span!("eventharvest.normalize_events", events = events)
}

#[inline]
pub(crate) fn verify_deployment(address: Address) -> Span {
    tracing::info_span!("eventharvest.verify_deployment", address = %address)
}
