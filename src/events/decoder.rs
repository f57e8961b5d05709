// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Log decoding against a contract's precomputed signature table
//!
//! A log whose first topic is not a known signature is not an error: logs
//! from unrelated events and contracts are common and simply yield
//! [`Decoded::NoMatch`]. A log that matches a signature but contradicts its
//! declared shape is a [`DecodeError`].

use std::collections::HashSet;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, BlockHash, BlockNumber, TxHash};
use serde::Serialize;

use super::value::{EventFields, EventValue};
use crate::contract::{ContractDescriptor, InputSlot};
use crate::errors::DecodeError;
use crate::rpc::RawLog;

/// Event names dropped before decoding
pub type ExcludedEvents = HashSet<String>;

/// A decoded log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedEvent {
    pub name: String,
    pub values: EventFields,
    pub block_number: BlockNumber,
    pub tx_hash: TxHash,
    pub log_index: u64,
    pub block_hash: BlockHash,
    /// Emitting contract
    pub address: Address,
}

/// Outcome of decoding one log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Event(DecodedEvent),
    /// The first topic is not a signature the contract declares
    NoMatch,
    /// The event is known but excluded by the caller
    Excluded,
}

impl Decoded {
    pub fn into_event(self) -> Option<DecodedEvent> {
        match self {
            Self::Event(event) => Some(event),
            Self::NoMatch | Self::Excluded => None,
        }
    }
}

/// Decoder bound to one contract's signature table
#[derive(Debug, Clone, Copy)]
pub struct LogDecoder<'a> {
    contract: &'a ContractDescriptor,
}

impl<'a> LogDecoder<'a> {
    pub fn new(contract: &'a ContractDescriptor) -> Self {
        Self { contract }
    }

    pub fn decode(&self, log: &RawLog, excluded: &ExcludedEvents) -> Result<Decoded, DecodeError> {
        decode_log(log, self.contract, excluded)
    }
}

/// Decode a log using a contract's signature table
///
/// Indexed fields come from `topics[1..]` in declared order; indexed
/// reference types yield [`EventValue::Hashed`]. Non-indexed fields are
/// decoded from the data payload in declared order. Pure and idempotent.
pub fn decode_log(
    log: &RawLog,
    contract: &ContractDescriptor,
    excluded: &ExcludedEvents,
) -> Result<Decoded, DecodeError> {
    let Some(event) = log.topics.first().and_then(|t| contract.event_by_topic(t)) else {
        return Ok(Decoded::NoMatch);
    };
    if excluded.contains(event.name()) {
        return Ok(Decoded::Excluded);
    }

    let expected = 1 + event.indexed_count();
    if log.topics.len() != expected {
        return Err(DecodeError::TopicCount {
            event: event.name().to_string(),
            tx_hash: log.transaction_hash,
            log_index: log.log_index,
            expected,
            actual: log.topics.len(),
        });
    }

    let data_error = |source| DecodeError::Data {
        event: event.name().to_string(),
        tx_hash: log.transaction_hash,
        log_index: log.log_index,
        source,
    };

    let data = match event.data_type().abi_decode_sequence(&log.data).map_err(data_error)? {
        DynSolValue::Tuple(values) => values,
        other => vec![other],
    };
    let data_inputs = event.inputs().len() - event.indexed_count();
    if data.len() != data_inputs {
        return Err(DecodeError::DataArity {
            event: event.name().to_string(),
            tx_hash: log.transaction_hash,
            log_index: log.log_index,
            expected: data_inputs,
            actual: data.len(),
        });
    }
    let mut data = data.into_iter();

    let mut values = EventFields::new();
    for (input, slot) in event.layout() {
        let value = match slot {
            InputSlot::Word { position } => input
                .ty
                .abi_decode(log.topics[position].as_slice())
                .map(EventValue::from)
                .map_err(data_error)?,
            InputSlot::Hashed { position } => EventValue::Hashed(log.topics[position]),
            // Data slots are numbered in declared order, like the decoded tuple.
            InputSlot::Data { .. } => match data.next() {
                Some(value) => EventValue::from(value),
                None => break,
            },
        };
        values.push(input.name.clone(), value);
    }

    Ok(Decoded::Event(DecodedEvent {
        name: event.name().to_string(),
        values,
        block_number: log.block_number,
        tx_hash: log.transaction_hash,
        log_index: log.log_index,
        block_hash: log.block_hash,
        address: log.address,
    }))
}
