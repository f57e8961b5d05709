//! Error types for the eventharvest library.
//!
//! This module follows a hybrid approach:
//!
//! - **Module-specific errors** for fine-grained handling ([`RangeError`],
//!   [`FilterError`], [`RetrievalError`], [`DecodeError`], ...)
//! - **Unified error type** ([`HarvestError`]) returned by the top-level
//!   harvest call
//!
//! # Retry policy
//!
//! Only [`RpcError`]s that report themselves as transient are retried, and
//! only inside the retrieval layer. Once the attempt budget is spent the
//! failure is wrapped in a [`RetrievalError`] naming the operation. Every
//! other error propagates unchanged and the harvest call fails atomically.
//!
//! # Example
//!
//! ```rust,ignore
//! use eventharvest::{harvest, HarvestError, RangeError};
//!
//! match harvest(&contracts, &rpc, &config, &request).await {
//!     Ok(events) => println!("{} events", events.len()),
//!     Err(HarvestError::Range(RangeError::FromBeyondHead { from, head })) => {
//!         eprintln!("block {from} is not mined yet (head {head})");
//!     }
//!     Err(HarvestError::Retrieval(e)) => eprintln!("giving up: {e}"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

mod contract;
mod decode;
mod encoding;
mod filter;
mod range;
mod retrieval;
mod rpc;

pub use contract::ContractError;
pub use decode::DecodeError;
pub use encoding::EncodingError;
pub use filter::FilterError;
pub use range::RangeError;
pub use retrieval::{RetrievalError, RpcOperation};
pub use rpc::RpcError;

/// Unified error type for harvest operations.
///
/// All module-specific error types convert into `HarvestError` via `From`,
/// so `?` propagates them naturally.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// The requested block range is invalid for the current chain head.
    #[error("Invalid range: {0}")]
    Range(#[from] RangeError),

    /// The filter could not be built from the request.
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// An RPC call exhausted its retry budget.
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    /// A log matched a known signature but does not fit its declared ABI.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A contract descriptor could not be built or verified.
    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),

    /// Provider construction failed.
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_error_converts() {
        let err: HarvestError = RangeError::FromBeyondHead { from: 10, head: 5 }.into();
        assert!(matches!(err, HarvestError::Range(_)));
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_filter_error_converts() {
        let err: HarvestError = FilterError::UnknownEvent {
            name: "Mint".into(),
        }
        .into();
        assert!(matches!(err, HarvestError::Filter(_)));
        assert!(err.to_string().contains("Mint"));
    }
}
