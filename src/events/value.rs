//! Owned, serializable decoded event values

use std::fmt;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{hex, Address, Bytes, B256, I256, U256};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A decoded ABI value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EventValue {
    Address(Address),
    Bool(bool),
    Uint(U256),
    Int(I256),
    /// `bytesN`, exactly N bytes
    FixedBytes(Bytes),
    Bytes(Bytes),
    String(String),
    Array(Vec<EventValue>),
    Tuple(Vec<EventValue>),
    /// Indexed reference type; only the keccak digest is on chain
    Hashed(B256),
}

impl EventValue {
    pub fn as_address(&self) -> Option<Address> {
        match self {
            Self::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<DynSolValue> for EventValue {
    fn from(value: DynSolValue) -> Self {
        match value {
            DynSolValue::Address(a) => Self::Address(a),
            DynSolValue::Bool(b) => Self::Bool(b),
            DynSolValue::Uint(v, _) => Self::Uint(v),
            DynSolValue::Int(v, _) => Self::Int(v),
            DynSolValue::FixedBytes(word, size) => {
                Self::FixedBytes(Bytes::copy_from_slice(&word[..size.min(32)]))
            }
            DynSolValue::Bytes(b) => Self::Bytes(b.into()),
            DynSolValue::String(s) => Self::String(s),
            DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
                Self::Array(values.into_iter().map(Self::from).collect())
            }
            DynSolValue::Tuple(values) => Self::Tuple(values.into_iter().map(Self::from).collect()),
            other => Self::Bytes(other.abi_encode().into()),
        }
    }
}

impl fmt::Display for EventValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(a) => write!(f, "{a}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::FixedBytes(b) | Self::Bytes(b) => write!(f, "{}", hex::encode_prefixed(b)),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Hashed(h) => write!(f, "{h}"),
            Self::Array(values) => write_list(f, "[", values, "]"),
            Self::Tuple(values) => write_list(f, "(", values, ")"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, open: &str, values: &[EventValue], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_str(close)
}

/// Decoded fields in declared order, addressable by name
///
/// Serializes as a map in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFields(Vec<(String, EventValue)>);

impl Serialize for EventFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl EventFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: EventValue) {
        self.0.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&EventValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EventFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}
