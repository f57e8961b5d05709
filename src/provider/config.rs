// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Provider configuration options

use std::time::Duration;

/// Configuration for [`create_http_provider`](super::create_http_provider)
///
/// # Example
///
/// ```rust
/// use eventharvest::provider::ProviderConfig;
///
/// let config = ProviderConfig::new("https://eth.llamarpc.com").with_rate_limit(10);
/// assert!(config.tracing);
/// ```
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// RPC endpoint URL
    pub url: String,
    /// Trace every JSON-RPC request
    pub tracing: bool,
    /// Minimum interval between requests (None for unlimited)
    pub min_interval: Option<Duration>,
    /// Report requests slower than this at `warn`
    pub slow_threshold: Option<Duration>,
}

impl ProviderConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tracing: true,
            min_interval: None,
            slow_threshold: None,
        }
    }

    /// Space requests to at most `requests_per_second`
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.min_interval = Some(Duration::from_secs(1) / requests_per_second.max(1));
        self
    }

    #[must_use]
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn without_tracing(mut self) -> Self {
        self.tracing = false;
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new("http://localhost:8545")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_traces_without_pacing() {
        let config = ProviderConfig::new("https://eth.llamarpc.com");
        assert_eq!(config.url, "https://eth.llamarpc.com");
        assert!(config.tracing);
        assert!(config.min_interval.is_none());
    }

    #[test]
    fn test_rate_limit_sets_interval() {
        let config = ProviderConfig::new("https://eth.llamarpc.com").with_rate_limit(10);
        assert_eq!(config.min_interval, Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_default_targets_local_node_without_pacing() {
        let config = ProviderConfig::default();
        assert_eq!(config.url, "http://localhost:8545");
        assert!(config.min_interval.is_none());
    }
}
