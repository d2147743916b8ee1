//! Error types for midgard-common.

use thiserror::Error;

/// Common error type for Midgard operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// Missing null terminator in string.
    #[error("string missing null terminator")]
    MissingNullTerminator,

    /// A null-terminated string ran past its allowed length.
    #[error("string exceeds {max} bytes without a null terminator")]
    StringTooLong { max: usize },
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
