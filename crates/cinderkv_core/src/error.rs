//! Error types for the CinderKV engine.

use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in engine operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] cinderkv_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Key absent or expired. Not worth logging.
    #[error("key not found")]
    NotFound,

    /// A record or marker failed validation and cannot be trusted.
    #[error("corrupt data: {message}")]
    Corrupt {
        /// Description of what failed to validate.
        message: String,
    },

    /// CRC32 of a record did not match its contents.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// The checksum stored in the record.
        expected: u32,
        /// The checksum computed over the record bytes.
        actual: u32,
    },

    /// Fewer bytes remained in the stream than a record requires.
    #[error("short read: needed {needed} bytes, {available} available")]
    ShortRead {
        /// Bytes the parse required.
        needed: u64,
        /// Bytes actually available.
        available: u64,
    },

    /// The payload transform pipeline failed during a write.
    #[error("transform failed: {message}")]
    Transform {
        /// Description of the failure.
        message: String,
    },

    /// Invalid configuration, caught at construction time.
    #[error("config error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// Invalid argument provided to an operation.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the argument problem.
        message: String,
    },

    /// Another process holds the data directory lock.
    #[error("data directory locked: another process has exclusive access")]
    Locked,

    /// Operation on a shut-down engine.
    #[error("store is closed")]
    Closed,
}

impl CoreError {
    /// Creates a corruption error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    /// Creates a transform failure error.
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// True when the error indicates untrustworthy on-disk bytes.
    ///
    /// Recovery truncates a file at the first record that fails this way.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Corrupt { .. } | Self::ChecksumMismatch { .. } | Self::ShortRead { .. }
        )
    }
}
