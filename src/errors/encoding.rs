/// An indexed filter value cannot be encoded as a topic.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// The value's kind differs from the declared ABI type.
    #[error("expected a value of type {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// The value does not fit the declared width.
    #[error("value does not fit in {ty}")]
    Overflow { ty: String },

    /// Arrays and tuples cannot be used as topic filters.
    #[error("indexed values of type {ty} cannot be used as a filter")]
    Unsupported { ty: String },

    /// Text input could not be coerced to the declared type.
    #[error("cannot read {input:?} as {ty}")]
    Coerce {
        ty: String,
        input: String,
        #[source]
        source: alloy_dyn_abi::Error,
    },
}

impl EncodingError {
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
