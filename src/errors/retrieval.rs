//! Terminal error for RPC calls that exhausted their retry budget.

use std::fmt;

use alloy_primitives::{Address, TxHash};

use super::RpcError;
use crate::events::LogFilter;
use crate::rpc::BlockRef;

/// The RPC call that failed, with enough context to reproduce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcOperation {
    BlockNumber,
    Logs(Box<LogFilter>),
    Block(BlockRef),
    Receipt(TxHash),
    Code(Address),
}

impl RpcOperation {
    /// The `(from, to)` sub-range of a failed log retrieval.
    pub fn sub_range(&self) -> Option<(u64, u64)> {
        match self {
            Self::Logs(filter) => filter.from_block.zip(filter.to_block),
            _ => None,
        }
    }
}

impl fmt::Display for RpcOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockNumber => f.write_str("eth_blockNumber"),
            Self::Logs(filter) => match self.sub_range() {
                Some((from, to)) => write!(f, "eth_getLogs for blocks {from}-{to}"),
                None => write!(f, "eth_getLogs for {:?}", filter.addresses),
            },
            Self::Block(block) => write!(f, "eth_getBlock for {block}"),
            Self::Receipt(tx) => write!(f, "eth_getTransactionReceipt for {tx}"),
            Self::Code(address) => write!(f, "eth_getCode for {address}"),
        }
    }
}

/// An RPC call failed on every allowed attempt, or failed permanently.
///
/// Aborts the enclosing harvest call; no partial results are returned.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed after {attempts} attempt(s): {source}")]
pub struct RetrievalError {
    pub operation: RpcOperation,
    pub attempts: u32,
    #[source]
    pub source: RpcError,
}
