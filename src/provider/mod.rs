// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP provider construction
//!
//! [`create_http_provider`] builds a plain alloy [`RootProvider`] (no
//! fillers, since the harvester only reads) with the tracing and pacing
//! layers from [`crate::transport`] as configured by [`ProviderConfig`].
//!
//! ```rust,ignore
//! use eventharvest::provider::{create_http_provider, ProviderConfig};
//! use eventharvest::AlloyRpc;
//!
//! let provider = create_http_provider(
//!     ProviderConfig::new("https://eth.llamarpc.com").with_rate_limit(10),
//! )?;
//! let rpc = AlloyRpc::new(provider);
//! ```

use alloy_network::Ethereum;
use alloy_provider::RootProvider;

mod config;
mod factory;

pub use config::ProviderConfig;
pub use factory::create_http_provider;

/// The provider type [`create_http_provider`] returns
pub type HttpProvider = RootProvider<Ethereum>;
