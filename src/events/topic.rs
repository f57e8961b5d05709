// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Topic encoding and matching
//!
//! Topics are the 32-byte words a log is indexed by. Position 0 holds the
//! event's signature hash and positions 1-3 hold indexed arguments.
//!
//! The matching rules in [`topic_matches`] are the only filter semantics
//! applied client-side, and they mirror what [`build_filter`] produces.
//!
//! [`build_filter`]: super::build_filter

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{keccak256, B256, I256};
use serde::{Deserialize, Serialize};

use crate::contract::EventSpec;
use crate::errors::EncodingError;

/// Constraint on one topic position
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicFilter {
    /// Wildcard
    #[default]
    Any,
    One(B256),
    /// Matches any member
    AnyOf(Vec<B256>),
}

impl TopicFilter {
    /// Collapse a set: empty is a wildcard, a singleton is exact equality.
    pub fn from_set(mut topics: Vec<B256>) -> Self {
        match topics.len() {
            0 => Self::Any,
            1 => Self::One(topics.remove(0)),
            _ => Self::AnyOf(topics),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Topics this position accepts; empty for a wildcard.
    pub fn values(&self) -> Vec<B256> {
        match self {
            Self::Any => Vec::new(),
            Self::One(topic) => vec![*topic],
            Self::AnyOf(topics) => topics.clone(),
        }
    }
}

impl From<B256> for TopicFilter {
    fn from(topic: B256) -> Self {
        Self::One(topic)
    }
}

/// keccak256 of the canonical signature `name(type1,type2,...)`
///
/// Parameter names do not take part, so two specs that differ only in
/// parameter names hash identically.
///
/// # Examples
///
/// ```
/// use eventharvest::{signature_topic, EventInput, EventSpec};
/// use alloy_dyn_abi::DynSolType;
/// use alloy_primitives::b256;
///
/// let transfer = EventSpec::new("Transfer", vec![
///     EventInput::new("from", DynSolType::Address, true),
///     EventInput::new("to", DynSolType::Address, true),
///     EventInput::new("value", DynSolType::Uint(256), false),
/// ]);
/// assert_eq!(
///     signature_topic(&transfer),
///     b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"),
/// );
/// ```
pub fn signature_topic(spec: &EventSpec) -> B256 {
    keccak256(spec.signature())
}

/// Encode a value as the topic an indexed input of type `ty` produces
///
/// Value types become their 32-byte ABI word: numbers and addresses are
/// left-padded, negative integers sign-extended, and `bytesN` right-padded.
/// `string` and `bytes` become the keccak256 of their raw bytes.
///
/// # Errors
///
/// [`EncodingError`] when the value's kind differs from `ty`, when it does
/// not fit the declared width, or when `ty` is an array or tuple.
pub fn encode_indexed_value(value: &DynSolValue, ty: &DynSolType) -> Result<B256, EncodingError> {
    let overflow = || EncodingError::Overflow {
        ty: ty.sol_type_name().into_owned(),
    };

    match (ty, value) {
        (DynSolType::Address, DynSolValue::Address(address)) => Ok(address.into_word()),
        (DynSolType::Bool, DynSolValue::Bool(b)) => Ok(B256::with_last_byte(u8::from(*b))),
        (DynSolType::Uint(bits), DynSolValue::Uint(v, _)) => {
            if v.bit_len() > *bits {
                return Err(overflow());
            }
            Ok(B256::from(v.to_be_bytes::<32>()))
        }
        (DynSolType::Int(bits), DynSolValue::Int(v, _)) => {
            if *bits < 256 {
                let shift = 256 - bits;
                if *v < I256::MIN.asr(shift) || *v > I256::MAX.asr(shift) {
                    return Err(overflow());
                }
            }
            Ok(B256::from(v.to_be_bytes::<32>()))
        }
        (DynSolType::FixedBytes(size), DynSolValue::FixedBytes(word, len)) => {
            if len > size {
                return Err(overflow());
            }
            Ok(*word)
        }
        (DynSolType::String, DynSolValue::String(s)) => Ok(keccak256(s.as_bytes())),
        (DynSolType::Bytes, DynSolValue::Bytes(b)) => Ok(keccak256(b)),
        (
            DynSolType::Array(_) | DynSolType::FixedArray(..) | DynSolType::Tuple(_),
            _,
        ) => Err(EncodingError::Unsupported {
            ty: ty.sol_type_name().into_owned(),
        }),
        (ty, value) => Err(EncodingError::type_mismatch(
            ty.sol_type_name(),
            value
                .sol_type_name()
                .map(|name| name.into_owned())
                .unwrap_or_else(|| "unknown".to_string()),
        )),
    }
}

/// Coerce text (hex, decimal, `true`/`false`, plain strings) into `ty`, then
/// encode it like [`encode_indexed_value`].
pub fn encode_indexed_str(input: &str, ty: &DynSolType) -> Result<B256, EncodingError> {
    let value = ty.coerce_str(input).map_err(|source| EncodingError::Coerce {
        ty: ty.sol_type_name().into_owned(),
        input: input.to_string(),
        source,
    })?;
    encode_indexed_value(&value, ty)
}

/// Wildcards match everything, sets match by membership, single values by
/// equality.
pub fn topic_matches(topic: &B256, filter: &TopicFilter) -> bool {
    match filter {
        TopicFilter::Any => true,
        TopicFilter::One(expected) => topic == expected,
        TopicFilter::AnyOf(set) => set.contains(topic),
    }
}

/// Positional match of a log's topics against a filter's topic constraints
///
/// A non-wildcard position the log has no topic for does not match.
pub fn topics_match(topics: &[B256], filters: &[TopicFilter]) -> bool {
    filters.iter().enumerate().all(|(i, filter)| match topics.get(i) {
        Some(topic) => topic_matches(topic, filter),
        None => filter.is_any(),
    })
}
