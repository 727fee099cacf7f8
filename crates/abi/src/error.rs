//! ABI error type.

/// ABI result type.
pub type Result<T, E = AbiError> = std::result::Result<T, E>;

/// Errors produced while describing types, encoding values, or decoding data.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    /// A type descriptor is structurally invalid, a canonical type name does
    /// not parse, or an operation does not support the given type.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// A value's shape does not match its declared type descriptor.
    #[error("type mismatch: expected {expected}, got a value of type {actual}")]
    TypeMismatch {
        /// The canonical name of the expected type.
        expected: String,
        /// The shape of the value that was provided.
        actual: String,
    },

    /// Encoded data is truncated, or an offset or length word points outside
    /// the buffer.
    #[error("malformed data: {0}")]
    MalformedData(String),

    /// A numeric value does not fit the declared bit width.
    #[error("overflow: value does not fit in {ty}")]
    Overflow {
        /// The canonical name of the target type.
        ty: String,
    },
}

impl AbiError {
    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedType(msg.into())
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedData(msg.into())
    }

    pub(crate) fn overflow(ty: impl Into<String>) -> Self {
        Self::Overflow { ty: ty.into() }
    }
}
