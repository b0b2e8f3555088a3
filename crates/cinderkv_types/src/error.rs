//! Error types for payload conversion.

use crate::kind::Kind;
use thiserror::Error;

/// Result type for payload conversions.
pub type TypeResult<T> = Result<T, TypeError>;

/// Errors that can occur converting between records and typed payloads.
#[derive(Debug, Error)]
pub enum TypeError {
    /// A typed read was attempted against a record of a different kind.
    #[error("kind mismatch: record holds {actual}, requested {expected}")]
    KindMismatch {
        /// The kind the caller asked for.
        expected: Kind,
        /// The kind stored in the record.
        actual: Kind,
    },

    /// Value bytes failed to serialize.
    #[error("value encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Value bytes failed to deserialize.
    #[error("value decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

impl TypeError {
    /// Creates a kind mismatch error.
    #[must_use]
    pub fn kind_mismatch(expected: Kind, actual: Kind) -> Self {
        Self::KindMismatch { expected, actual }
    }
}
