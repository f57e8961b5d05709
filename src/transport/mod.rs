// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower middleware for the alloy RPC client
//!
//! - [`TraceLayer`] records each JSON-RPC method, its duration and failures
//! - [`PacingLayer`] keeps a minimum interval between requests, for
//!   endpoints with strict rate limits
//!
//! ```rust,ignore
//! use eventharvest::transport::{PacingLayer, TraceLayer};
//! use alloy_rpc_client::ClientBuilder;
//!
//! let client = ClientBuilder::default()
//!     .layer(TraceLayer::new())
//!     .layer(PacingLayer::per_second(10))
//!     .http(rpc_url);
//! ```

mod pacing;
mod trace;

pub use pacing::{PacingLayer, PacingService};
pub use trace::{TraceLayer, TraceService};
