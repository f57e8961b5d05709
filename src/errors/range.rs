/// The requested block range cannot be served.
///
/// Raised before any log or block retrieval is attempted. Never retried:
/// the caller has to correct the request, or opt into
/// [`RangePolicy::FallbackToDeployment`](crate::RangePolicy::FallbackToDeployment).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// `from` is beyond the current chain head.
    #[error("from block {from} is beyond the chain head {head}")]
    FromBeyondHead { from: u64, head: u64 },

    /// `from` is greater than `to` after resolving `"latest"`.
    #[error("from block {from} is after to block {to}")]
    FromAfterTo { from: u64, to: u64 },
}
