//! Configuration for harvest operations
//!
//! Controls block range limits, pacing, timeouts, retries and fan-out.
//! Settings that depend on the node's rate limits can be overridden per
//! chain.
//!
//! # Example: Using defaults
//!
//! ```rust
//! use eventharvest::HarvestConfig;
//!
//! let config = HarvestConfig::default();
//! assert_eq!(config.retry.max_attempts, 5);
//! ```
//!
//! # Example: Custom configuration
//!
//! ```rust
//! use eventharvest::HarvestConfigBuilder;
//! use std::time::Duration;
//! use alloy_chains::NamedChain;
//!
//! let config = HarvestConfigBuilder::with_defaults()
//!     .max_block_range(2000)
//!     .chain_rate_limit(NamedChain::Arbitrum, Duration::from_millis(100))
//!     .receipt_concurrency(8)
//!     .build();
//! ```

use std::collections::HashMap;
use std::time::Duration;

use alloy_chains::NamedChain;
use serde::{Deserialize, Serialize};

use crate::config_types::MaxBlockRange;
use crate::rpc::RetryPolicy;

pub mod constants;

use constants::{
    DEFAULT_BLOCK_CONCURRENCY, DEFAULT_RECEIPT_CONCURRENCY, DEFAULT_REQUEST_DELAY,
    DEFAULT_RPC_TIMEOUT, STRICT_CHAIN_DELAY,
};

/// What to do when a requested range is invalid for the chain head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicy {
    /// Fail with [`RangeError`](crate::RangeError)
    #[default]
    Strict,
    /// Replace the range with `[deployment block, head]` and log a warning
    FallbackToDeployment,
}

/// How logs are retrieved from the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// `eth_getLogs` over batched sub-ranges
    #[default]
    Logs,
    /// Walk every block and transaction receipt in the range
    ///
    /// For nodes without `eth_getLogs` filtering. Much slower.
    BlockScan,
}

/// Configuration for harvest operations
///
/// Use [`HarvestConfigBuilder`] for a fluent API to construct instances.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Maximum width of a single `eth_getLogs` request
    /// Default: 5000 blocks
    pub max_block_range: MaxBlockRange,

    /// Delay between consecutive sub-range requests
    /// Default: None
    pub rate_limit_delay: Option<Duration>,

    /// Timeout for each individual RPC call
    /// Default: 30 seconds
    pub rpc_timeout: Duration,

    /// Retry discipline for every RPC call
    pub retry: RetryPolicy,

    /// Blocks fetched at once, on the block-scan path and during normalization
    pub block_concurrency: usize,

    /// Receipts fetched at once
    pub receipt_concurrency: usize,

    /// Delay before each fanned-out block or receipt request
    /// Default: 20ms
    pub request_delay: Option<Duration>,

    pub range_policy: RangePolicy,

    pub retrieval_mode: RetrievalMode,

    /// Split wide ranges into sub-ranges. When disabled the whole range is
    /// requested in one call.
    pub batching: bool,

    /// Chain-specific overrides
    pub chain_overrides: HashMap<NamedChain, ChainConfig>,
}

/// Chain-specific configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ChainConfig {
    pub max_block_range: Option<MaxBlockRange>,
    pub rate_limit_delay: Option<Duration>,
    pub rpc_timeout: Option<Duration>,
}

/// Settings in effect for one harvest call, after chain overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub max_block_range: MaxBlockRange,
    pub rate_limit_delay: Option<Duration>,
    pub rpc_timeout: Duration,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self::with_common_defaults()
    }
}

impl HarvestConfig {
    /// Create config with defaults suited to hosted RPC providers
    ///
    /// Base and Sonic get a 250ms delay between sub-range requests.
    pub fn with_common_defaults() -> Self {
        let mut config = Self::minimal();

        for chain in [NamedChain::Base, NamedChain::Sonic] {
            config.set_chain_override(
                chain,
                ChainConfig {
                    rate_limit_delay: Some(STRICT_CHAIN_DELAY),
                    ..Default::default()
                },
            );
        }

        config
    }

    /// Create minimal config with no sub-range delays and no chain overrides
    pub fn minimal() -> Self {
        Self {
            max_block_range: MaxBlockRange::DEFAULT,
            rate_limit_delay: None,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            retry: RetryPolicy::default(),
            block_concurrency: DEFAULT_BLOCK_CONCURRENCY,
            receipt_concurrency: DEFAULT_RECEIPT_CONCURRENCY,
            request_delay: Some(DEFAULT_REQUEST_DELAY),
            range_policy: RangePolicy::Strict,
            retrieval_mode: RetrievalMode::Logs,
            batching: true,
            chain_overrides: HashMap::new(),
        }
    }

    /// Get effective max block range for a specific chain
    ///
    /// # Example
    ///
    /// ```rust
    /// use eventharvest::{HarvestConfigBuilder, MaxBlockRange};
    /// use alloy_chains::NamedChain;
    ///
    /// let config = HarvestConfigBuilder::new()
    ///     .chain_max_blocks(NamedChain::Polygon, 1000)
    ///     .build();
    ///
    /// assert_eq!(config.get_max_block_range(NamedChain::Polygon), MaxBlockRange::new(1000));
    /// assert_eq!(config.get_max_block_range(NamedChain::Mainnet), MaxBlockRange::DEFAULT);
    /// ```
    pub fn get_max_block_range(&self, chain: NamedChain) -> MaxBlockRange {
        self.chain_overrides
            .get(&chain)
            .and_then(|c| c.max_block_range)
            .unwrap_or(self.max_block_range)
    }

    /// Get effective rate limit delay for a specific chain
    pub fn get_rate_limit_delay(&self, chain: NamedChain) -> Option<Duration> {
        self.chain_overrides
            .get(&chain)
            .and_then(|c| c.rate_limit_delay)
            .or(self.rate_limit_delay)
    }

    /// Get effective RPC timeout for a specific chain
    pub fn get_rpc_timeout(&self, chain: NamedChain) -> Duration {
        self.chain_overrides
            .get(&chain)
            .and_then(|c| c.rpc_timeout)
            .unwrap_or(self.rpc_timeout)
    }

    /// Resolve the settings for a harvest call
    ///
    /// Without a known chain the global values apply.
    pub fn settings(&self, chain: Option<NamedChain>) -> ScanSettings {
        match chain {
            Some(chain) => ScanSettings {
                max_block_range: self.get_max_block_range(chain),
                rate_limit_delay: self.get_rate_limit_delay(chain),
                rpc_timeout: self.get_rpc_timeout(chain),
            },
            None => ScanSettings {
                max_block_range: self.max_block_range,
                rate_limit_delay: self.rate_limit_delay,
                rpc_timeout: self.rpc_timeout,
            },
        }
    }

    /// Set chain-specific override
    pub fn set_chain_override(&mut self, chain: NamedChain, config: ChainConfig) {
        self.chain_overrides.insert(chain, config);
    }
}

/// Builder for [`HarvestConfig`]
///
/// # Example
///
/// ```rust
/// use eventharvest::{HarvestConfigBuilder, RetrievalMode};
/// use std::time::Duration;
///
/// let config = HarvestConfigBuilder::new()
///     .max_block_range(1000)
///     .rate_limit_delay(Duration::from_millis(500))
///     .retrieval_mode(RetrievalMode::BlockScan)
///     .build();
/// assert_eq!(config.max_block_range.as_u64(), 1000);
/// ```
pub struct HarvestConfigBuilder {
    config: HarvestConfig,
}

impl Default for HarvestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HarvestConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: HarvestConfig::minimal(),
        }
    }

    /// Start with common defaults
    pub fn with_defaults() -> Self {
        Self {
            config: HarvestConfig::with_common_defaults(),
        }
    }

    /// Set global max block range
    pub fn max_block_range(mut self, max: u64) -> Self {
        self.config.max_block_range = MaxBlockRange::new(max);
        self
    }

    /// Set global delay between sub-range requests
    pub fn rate_limit_delay(mut self, delay: Duration) -> Self {
        self.config.rate_limit_delay = Some(delay);
        self
    }

    /// Set global per-call RPC timeout
    pub fn rpc_timeout(mut self, timeout: Duration) -> Self {
        self.config.rpc_timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the block fan-out bound. Zero is treated as one.
    pub fn block_concurrency(mut self, n: usize) -> Self {
        self.config.block_concurrency = n.max(1);
        self
    }

    /// Set the receipt fan-out bound. Zero is treated as one.
    pub fn receipt_concurrency(mut self, n: usize) -> Self {
        self.config.receipt_concurrency = n.max(1);
        self
    }

    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.config.request_delay = Some(delay);
        self
    }

    pub fn range_policy(mut self, policy: RangePolicy) -> Self {
        self.config.range_policy = policy;
        self
    }

    pub fn retrieval_mode(mut self, mode: RetrievalMode) -> Self {
        self.config.retrieval_mode = mode;
        self
    }

    pub fn batching(mut self, enabled: bool) -> Self {
        self.config.batching = enabled;
        self
    }

    /// Add chain-specific configuration
    pub fn chain_config(mut self, chain: NamedChain, config: ChainConfig) -> Self {
        self.config.set_chain_override(chain, config);
        self
    }

    /// Convenience: set rate limit delay for a specific chain
    pub fn chain_rate_limit(mut self, chain: NamedChain, delay: Duration) -> Self {
        let mut chain_config = self
            .config
            .chain_overrides
            .remove(&chain)
            .unwrap_or_default();
        chain_config.rate_limit_delay = Some(delay);
        self.config.set_chain_override(chain, chain_config);
        self
    }

    /// Convenience: set max block range for a specific chain
    pub fn chain_max_blocks(mut self, chain: NamedChain, max: u64) -> Self {
        let mut chain_config = self
            .config
            .chain_overrides
            .remove(&chain)
            .unwrap_or_default();
        chain_config.max_block_range = Some(MaxBlockRange::new(max));
        self.config.set_chain_override(chain, chain_config);
        self
    }

    /// Convenience: set RPC timeout for a specific chain
    pub fn chain_timeout(mut self, chain: NamedChain, timeout: Duration) -> Self {
        let mut chain_config = self
            .config
            .chain_overrides
            .remove(&chain)
            .unwrap_or_default();
        chain_config.rpc_timeout = Some(timeout);
        self.config.set_chain_override(chain, chain_config);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> HarvestConfig {
        self.config
    }
}
