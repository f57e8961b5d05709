// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tracked contracts and their event declarations
//!
//! A [`ContractDescriptor`] is built once from a contract's ABI and is
//! read-only afterwards. The signature-topic table used by the decoder is
//! precomputed at construction, so decoding a log is a single map lookup.
//!
//! # Example
//!
//! ```rust
//! use eventharvest::ContractDescriptor;
//! use alloy_primitives::address;
//!
//! let abi = r#"[{
//!     "type": "event",
//!     "name": "Transfer",
//!     "anonymous": false,
//!     "inputs": [
//!         {"name": "_from", "type": "address", "indexed": true},
//!         {"name": "_to", "type": "address", "indexed": true},
//!         {"name": "_value", "type": "uint256", "indexed": false}
//!     ]
//! }]"#;
//!
//! let token = ContractDescriptor::from_abi_json(
//!     address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
//!     abi,
//! )?
//! .named("USDC")
//! .deployed_at(6_082_465);
//!
//! assert!(token.knows_event("Transfer"));
//! assert_eq!(token.signature_topics().len(), 1);
//! # Ok::<(), eventharvest::ContractError>(())
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use alloy_dyn_abi::{DynSolType, Specifier};
use alloy_json_abi::{Event, JsonAbi};
use alloy_primitives::{Address, B256};

use crate::config::constants::{DEFAULT_START_BLOCK, UNLABELED};
use crate::errors::ContractError;
use crate::events::signature_topic;

/// One declared input of an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInput {
    pub name: String,
    pub ty: DynSolType,
    pub indexed: bool,
}

impl EventInput {
    pub fn new(name: impl Into<String>, ty: DynSolType, indexed: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed,
        }
    }

    /// Reference types are stored in topics as a keccak digest of their
    /// encoding; the original value cannot be recovered from the log.
    pub fn is_hashed_in_topic(&self) -> bool {
        matches!(
            self.ty,
            DynSolType::String
                | DynSolType::Bytes
                | DynSolType::Array(_)
                | DynSolType::FixedArray(..)
                | DynSolType::Tuple(_)
        )
    }
}

/// Where the decoder finds an input's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSlot {
    /// ABI word in `topics[position]`
    Word { position: usize },
    /// keccak digest in `topics[position]`
    Hashed { position: usize },
    /// Element `index` of the tuple decoded from the data payload
    Data { index: usize },
}

/// An event declaration with its decode plan
///
/// The signature topic and slot layout are computed once in
/// [`EventSpec::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpec {
    name: String,
    inputs: Vec<EventInput>,
    anonymous: bool,
    slots: Vec<InputSlot>,
    data_type: DynSolType,
    topic: B256,
}

impl EventSpec {
    /// Build a spec. Unnamed inputs are named `arg{i}` by position.
    pub fn new(name: impl Into<String>, inputs: Vec<EventInput>) -> Self {
        let inputs: Vec<EventInput> = inputs
            .into_iter()
            .enumerate()
            .map(|(i, mut input)| {
                if input.name.is_empty() {
                    input.name = format!("arg{i}");
                }
                input
            })
            .collect();

        let mut slots = Vec::with_capacity(inputs.len());
        let mut data_types = Vec::new();
        let mut position = 1;
        for input in &inputs {
            if input.indexed {
                slots.push(if input.is_hashed_in_topic() {
                    InputSlot::Hashed { position }
                } else {
                    InputSlot::Word { position }
                });
                position += 1;
            } else {
                slots.push(InputSlot::Data {
                    index: data_types.len(),
                });
                data_types.push(input.ty.clone());
            }
        }

        let mut spec = Self {
            name: name.into(),
            inputs,
            anonymous: false,
            slots,
            data_type: DynSolType::Tuple(data_types),
            topic: B256::ZERO,
        };
        spec.topic = signature_topic(&spec);
        spec
    }

    /// Mark the event as anonymous: it has no signature topic and is never
    /// matched by topic lookup.
    pub fn into_anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Build from a JSON ABI event entry
    pub fn from_abi(event: &Event) -> Result<Self, ContractError> {
        let inputs = event
            .inputs
            .iter()
            .map(|param| {
                let ty = param.resolve().map_err(|source| ContractError::InvalidType {
                    event: event.name.clone(),
                    input: param.name.clone(),
                    source,
                })?;
                Ok(EventInput::new(param.name.clone(), ty, param.indexed))
            })
            .collect::<Result<Vec<_>, ContractError>>()?;

        let spec = Self::new(event.name.clone(), inputs);
        Ok(if event.anonymous {
            spec.into_anonymous()
        } else {
            spec
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[EventInput] {
        &self.inputs
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Canonical signature, `name(type1,type2,...)`
    pub fn signature(&self) -> String {
        let types: Vec<_> = self.inputs.iter().map(|i| i.ty.sol_type_name()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// Precomputed keccak256 of [`signature`](Self::signature)
    pub fn signature_topic(&self) -> B256 {
        self.topic
    }

    pub fn indexed_inputs(&self) -> impl Iterator<Item = &EventInput> {
        self.inputs.iter().filter(|i| i.indexed)
    }

    pub fn indexed_count(&self) -> usize {
        self.indexed_inputs().count()
    }

    /// Inputs paired with where their values live in a log
    pub fn layout(&self) -> impl Iterator<Item = (&EventInput, InputSlot)> {
        self.inputs.iter().zip(self.slots.iter().copied())
    }

    /// Tuple of the non-indexed input types, in declared order
    pub fn data_type(&self) -> &DynSolType {
        &self.data_type
    }
}

#[derive(Debug, Clone)]
struct Descriptor {
    name: Option<String>,
    address: Address,
    events: Vec<EventSpec>,
    start_block: u64,
    by_topic: HashMap<B256, usize>,
}

/// A tracked contract: address, events, optional label and deployment block
///
/// Cheap to clone; clones share the same immutable tables.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    inner: Arc<Descriptor>,
}

impl ContractDescriptor {
    pub fn new(address: Address, events: Vec<EventSpec>) -> Self {
        // First declaration wins when two events share a signature.
        let mut by_topic = HashMap::with_capacity(events.len());
        for (i, event) in events.iter().enumerate() {
            if !event.is_anonymous() {
                by_topic.entry(event.signature_topic()).or_insert(i);
            }
        }

        Self {
            inner: Arc::new(Descriptor {
                name: None,
                address,
                events,
                start_block: DEFAULT_START_BLOCK,
                by_topic,
            }),
        }
    }

    /// Build from a JSON ABI document
    ///
    /// Accepts either a plain ABI array or a build artifact object with an
    /// `abi` key.
    pub fn from_abi_json(address: Address, json: &str) -> Result<Self, ContractError> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(abi) = value.get_mut("abi") {
            value = abi.take();
        }
        let abi: JsonAbi = serde_json::from_value(value)?;
        Self::from_abi(address, &abi)
    }

    pub fn from_abi(address: Address, abi: &JsonAbi) -> Result<Self, ContractError> {
        let events = abi
            .events()
            .map(EventSpec::from_abi)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(address, events))
    }

    /// Attach a human label, reported on events from transactions sent to
    /// this contract.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).name = Some(name.into());
        self
    }

    /// Set the deployment block, used as the default start of a harvest.
    pub fn deployed_at(mut self, block: u64) -> Self {
        Arc::make_mut(&mut self.inner).start_block = block;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Name, or `"n/a"` for unnamed contracts
    pub fn label(&self) -> &str {
        self.name().unwrap_or(UNLABELED)
    }

    pub fn address(&self) -> Address {
        self.inner.address
    }

    pub fn start_block(&self) -> u64 {
        self.inner.start_block
    }

    pub fn events(&self) -> &[EventSpec] {
        &self.inner.events
    }

    /// Exact lookup of a log's first topic
    pub fn event_by_topic(&self, topic: &B256) -> Option<&EventSpec> {
        self.inner.by_topic.get(topic).map(|&i| &self.inner.events[i])
    }

    /// All non-anonymous declarations with this name (overloads included)
    pub fn events_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a EventSpec> {
        self.inner
            .events
            .iter()
            .filter(move |e| !e.is_anonymous() && e.name() == name)
    }

    pub fn knows_event(&self, name: &str) -> bool {
        self.events_named(name).next().is_some()
    }

    /// Signature topics of every non-anonymous event, without duplicates
    pub fn signature_topics(&self) -> Vec<B256> {
        let mut topics: Vec<B256> = Vec::with_capacity(self.inner.by_topic.len());
        for event in self.inner.events.iter().filter(|e| !e.is_anonymous()) {
            let topic = event.signature_topic();
            if !topics.contains(&topic) {
                topics.push(topic);
            }
        }
        topics
    }
}
