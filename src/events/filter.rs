// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Log filter construction
//!
//! [`build_filter`] turns a contract descriptor, event names and indexed
//! argument values into a [`LogFilter`]. The same filter is later used to
//! verify each returned log client-side with [`LogFilter::matches`], since
//! providers may return over-broad result sets.
//!
//! # Indexed arguments bind to the first event name
//!
//! Indexed-argument constraints are laid out along the indexed inputs of
//! the **first** requested event only. The topic positions they produce
//! apply to every event in the filter. Callers that need per-event indexed
//! filters issue one call per event name.
//!
//! ```rust,ignore
//! use eventharvest::{build_filter, IndexedArgs};
//!
//! let mut args = IndexedArgs::new();
//! args.insert("_to".into(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".into());
//!
//! let filter = build_filter(&token, None, &["Transfer"], &args)?;
//! // topics: [Transfer signature, any, _to]
//! ```

use std::collections::BTreeMap;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, BlockNumber, B256};
use serde::{Deserialize, Serialize};

use super::topic::{encode_indexed_str, encode_indexed_value, topics_match, TopicFilter};
use crate::config_types::ResolvedRange;
use crate::contract::ContractDescriptor;
use crate::errors::{EncodingError, FilterError};
use crate::rpc::RawLog;

/// Filter descriptor for `eth_getLogs`
///
/// Without block bounds the filter is a template; the range batcher
/// instantiates it per sub-range with [`LogFilter::with_range`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogFilter {
    pub from_block: Option<BlockNumber>,
    pub to_block: Option<BlockNumber>,
    /// Emitting contracts; empty matches any address
    pub addresses: Vec<Address>,
    /// Constraints by topic position; missing trailing positions are wildcards
    pub topics: Vec<TopicFilter>,
}

impl LogFilter {
    pub fn with_range(mut self, from: BlockNumber, to: BlockNumber) -> Self {
        self.from_block = Some(from);
        self.to_block = Some(to);
        self
    }

    /// Whether a log satisfies this filter
    ///
    /// Checks the block bounds that are set, address membership (a byte-level
    /// comparison, so checksum casing is irrelevant) and the positional topic
    /// constraints.
    pub fn matches(&self, log: &RawLog) -> bool {
        if self.from_block.is_some_and(|from| log.block_number < from)
            || self.to_block.is_some_and(|to| log.block_number > to)
        {
            return false;
        }
        if !self.addresses.is_empty() && !self.addresses.contains(&log.address) {
            return false;
        }
        topics_match(&log.topics, &self.topics)
    }
}

/// A caller-supplied indexed argument value
#[derive(Debug, Clone, PartialEq)]
pub enum IndexedArg {
    /// Already typed
    Value(DynSolValue),
    /// Text coerced through the declared ABI type (hex, decimal, bool)
    Text(String),
}

impl IndexedArg {
    /// Encode as the topic an indexed input of type `ty` would carry
    pub fn encode(&self, ty: &DynSolType) -> Result<B256, EncodingError> {
        match self {
            Self::Value(value) => encode_indexed_value(value, ty),
            Self::Text(text) => encode_indexed_str(text, ty),
        }
    }
}

impl From<DynSolValue> for IndexedArg {
    fn from(value: DynSolValue) -> Self {
        Self::Value(value)
    }
}

impl From<Address> for IndexedArg {
    fn from(value: Address) -> Self {
        Self::Value(DynSolValue::Address(value))
    }
}

impl From<&str> for IndexedArg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for IndexedArg {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Topic positions after the signature
const MAX_INDEXED: usize = 3;

/// Indexed argument values by input name
pub type IndexedArgs = BTreeMap<String, IndexedArg>;

/// Build the log filter for one contract
///
/// - no `event_names`: topic 0 is every signature the contract declares
/// - otherwise: topic 0 is the signatures of the named events (OR)
/// - `indexed_args` constrain the first named event's indexed inputs in
///   declared order; inputs without a value are wildcards
///
/// # Errors
///
/// - [`FilterError::UnknownEvent`] for a name the contract does not declare
/// - [`FilterError::IndexedArgsWithoutEvent`] for indexed args without names
/// - [`FilterError::UnknownIndexedArgument`] for an argument that is not an
///   indexed input of the first event
/// - [`FilterError::TooManyTopics`] when the first event declares more
///   indexed inputs than a log can carry
/// - [`FilterError::Encoding`] when a value does not fit its declared type
pub fn build_filter<S: AsRef<str>>(
    descriptor: &ContractDescriptor,
    range: Option<ResolvedRange>,
    event_names: &[S],
    indexed_args: &IndexedArgs,
) -> Result<LogFilter, FilterError> {
    let signatures = if event_names.is_empty() {
        descriptor.signature_topics()
    } else {
        let mut signatures = Vec::new();
        for name in event_names {
            let name = name.as_ref();
            if !descriptor.knows_event(name) {
                return Err(FilterError::UnknownEvent {
                    name: name.to_string(),
                });
            }
            for event in descriptor.events_named(name) {
                let topic = event.signature_topic();
                if !signatures.contains(&topic) {
                    signatures.push(topic);
                }
            }
        }
        signatures
    };

    let mut topics = vec![TopicFilter::from_set(signatures)];

    if !indexed_args.is_empty() {
        let first = event_names
            .first()
            .ok_or(FilterError::IndexedArgsWithoutEvent)?
            .as_ref();
        let event = descriptor
            .events_named(first)
            .next()
            .ok_or_else(|| FilterError::UnknownEvent {
                name: first.to_string(),
            })?;

        if event.indexed_count() > MAX_INDEXED {
            return Err(FilterError::TooManyTopics {
                event: event.name().to_string(),
                indexed: event.indexed_count(),
            });
        }

        if let Some(argument) = indexed_args
            .keys()
            .find(|key| !event.indexed_inputs().any(|input| &input.name == *key))
        {
            return Err(FilterError::UnknownIndexedArgument {
                event: event.name().to_string(),
                argument: argument.clone(),
            });
        }

        for input in event.indexed_inputs() {
            let position = match indexed_args.get(&input.name) {
                Some(arg) => {
                    let topic = arg.encode(&input.ty).map_err(|source| FilterError::Encoding {
                        argument: input.name.clone(),
                        source,
                    })?;
                    TopicFilter::One(topic)
                }
                None => TopicFilter::Any,
            };
            topics.push(position);
        }

        while topics.len() > 1 && topics.last().is_some_and(TopicFilter::is_any) {
            topics.pop();
        }
    }

    let filter = LogFilter {
        from_block: None,
        to_block: None,
        addresses: vec![descriptor.address()],
        topics,
    };

    Ok(match range {
        Some(range) => filter.with_range(range.from, range.to),
        None => filter,
    })
}
