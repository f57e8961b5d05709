//! Errors for individual blockchain RPC calls.
//!
//! An [`RpcError`] describes one failed call. The retrieval layer decides
//! from [`RpcError::is_transient`] whether another attempt is worthwhile.

use std::time::Duration;

/// A single RPC call failed.
///
/// # Examples
///
/// ```rust
/// use eventharvest::RpcError;
///
/// let error = RpcError::not_found("block 0x12ab");
/// assert!(error.is_transient());
///
/// let error = RpcError::malformed("log without block number");
/// assert!(!error.is_transient());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The transport or node returned an error.
    ///
    /// `retryable` carries the transport's own classification (rate limits,
    /// dropped connections and 5xx responses are retryable).
    #[error("transport error: {source}")]
    Transport {
        retryable: bool,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The call did not complete within the per-call timeout.
    #[error("call timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The node does not (yet) know the requested block or receipt.
    #[error("{what} not found")]
    NotFound { what: String },

    /// The endpoint is temporarily unable to serve the call.
    #[error("endpoint unavailable: {details}")]
    Unavailable { details: String },

    /// The response is missing fields the engine relies on.
    #[error("malformed response: {details}")]
    Malformed { details: String },

    /// The endpoint URL could not be parsed.
    #[error("invalid provider URL: {0}")]
    ProviderUrlInvalid(String),
}

impl RpcError {
    /// Whether another attempt of the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { retryable, .. } => *retryable,
            Self::Timeout { .. } | Self::NotFound { .. } | Self::Unavailable { .. } => true,
            Self::Malformed { .. } | Self::ProviderUrlInvalid(_) => false,
        }
    }

    pub fn transport(
        retryable: bool,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            retryable,
            source: Box::new(source),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn unavailable(details: impl Into<String>) -> Self {
        Self::Unavailable {
            details: details.into(),
        }
    }

    pub fn malformed(details: impl Into<String>) -> Self {
        Self::Malformed {
            details: details.into(),
        }
    }
}
