// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Event processing pipeline
//!
//! This module handles:
//! - Signature topics and indexed-value encoding ([`topic`])
//! - Log filter construction and client-side verification ([`filter`])
//! - Batched `eth_getLogs` retrieval ([`scanner`])
//! - Block and receipt walking when `eth_getLogs` is unavailable
//! - Log decoding ([`decoder`]) and normalization ([`normalize`])

pub(crate) mod block_scan;
pub mod decoder;
pub mod filter;
pub mod normalize;
pub mod scanner;
pub mod topic;
pub mod value;

pub use decoder::{decode_log, Decoded, DecodedEvent, ExcludedEvents, LogDecoder};
pub use filter::{build_filter, IndexedArg, IndexedArgs, LogFilter};
pub use normalize::{normalize, NormalizedEvent};
pub use scanner::LogScanner;
pub use topic::{
    encode_indexed_str, encode_indexed_value, signature_topic, topic_matches, topics_match,
    TopicFilter,
};
pub use value::{EventFields, EventValue};
