use alloy_primitives::TxHash;

/// A log matched a known event signature but its shape contradicts the
/// declared ABI. Surfaced to the caller, never retried.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The log carries a different number of topics than the event declares.
    #[error(
        "{event} in tx {tx_hash} (log {log_index}): expected {expected} topics, found {actual}"
    )]
    TopicCount {
        event: String,
        tx_hash: TxHash,
        log_index: u64,
        expected: usize,
        actual: usize,
    },

    /// The data payload decoded to a different number of values than the
    /// event's non-indexed inputs.
    #[error(
        "{event} in tx {tx_hash} (log {log_index}): expected {expected} data values, found {actual}"
    )]
    DataArity {
        event: String,
        tx_hash: TxHash,
        log_index: u64,
        expected: usize,
        actual: usize,
    },

    /// A topic or the data payload failed ABI decoding.
    #[error("{event} in tx {tx_hash} (log {log_index}): {source}")]
    Data {
        event: String,
        tx_hash: TxHash,
        log_index: u64,
        #[source]
        source: alloy_dyn_abi::Error,
    },
}
