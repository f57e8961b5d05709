// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP provider factory

use alloy_provider::ProviderBuilder;
use alloy_rpc_client::{ClientBuilder, RpcClient};

use crate::errors::RpcError;
use crate::transport::{PacingLayer, TraceLayer};

use super::config::ProviderConfig;
use super::HttpProvider;

/// Create an HTTP provider with the given configuration
///
/// # Errors
///
/// Returns [`RpcError::ProviderUrlInvalid`] if the URL cannot be parsed.
pub fn create_http_provider(config: ProviderConfig) -> Result<HttpProvider, RpcError> {
    let url: url::Url = config
        .url
        .parse()
        .map_err(|e| RpcError::ProviderUrlInvalid(format!("{}: {e}", config.url)))?;

    let trace = config.tracing.then(|| {
        let layer = TraceLayer::new();
        match config.slow_threshold {
            Some(threshold) => layer.slow_threshold(threshold),
            None => layer,
        }
    });
    let pacing = config.min_interval.map(PacingLayer::new);

    let client: RpcClient = match (trace, pacing) {
        (Some(trace), Some(pacing)) => ClientBuilder::default().layer(trace).layer(pacing).http(url),
        (Some(trace), None) => ClientBuilder::default().layer(trace).http(url),
        (None, Some(pacing)) => ClientBuilder::default().layer(pacing).http(url),
        (None, None) => ClientBuilder::default().http(url),
    };

    Ok(ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_client(client))
}
