//! Engine defaults
//!
//! Centralizes the constants used by [`HarvestConfig`](super::HarvestConfig)
//! and the retrieval layer.

use std::time::Duration;

/// Attempts per RPC call before giving up (initial call included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Base delay for exponential backoff
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);

/// Upper bound on a single backoff delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Per-call RPC timeout
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocks fetched concurrently on the block-scan path
pub const DEFAULT_BLOCK_CONCURRENCY: usize = 1;

/// Receipts fetched concurrently per block, and during normalization joins
pub const DEFAULT_RECEIPT_CONCURRENCY: usize = 4;

/// Delay before each fanned-out block or receipt request
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(20);

/// Delay applied between sub-range requests on chains with strict limits
pub const STRICT_CHAIN_DELAY: Duration = Duration::from_millis(250);

/// Deployment block assumed when a contract does not declare one
pub const DEFAULT_START_BLOCK: u64 = 1;

/// Label used when a log's transaction was not sent to the emitting contract
pub const UNLABELED: &str = "n/a";
