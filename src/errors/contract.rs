use std::path::PathBuf;

use alloy_primitives::Address;

/// A contract descriptor could not be built or verified.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// The ABI document is not valid JSON ABI.
    #[error("invalid ABI JSON: {0}")]
    InvalidAbi(#[from] serde_json::Error),

    /// An event input declares a type the engine cannot resolve.
    #[error("event {event}: cannot resolve type of input {input:?}: {source}")]
    InvalidType {
        event: String,
        input: String,
        #[source]
        source: alloy_dyn_abi::Error,
    },

    /// No contract code is deployed at the address.
    #[error("no contract code at {address}")]
    NoCode { address: Address },

    /// A contract manifest is not a valid list of contract entries.
    #[error("invalid manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A manifest or ABI file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
