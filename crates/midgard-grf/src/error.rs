//! Error types for the GRF crate.

use thiserror::Error;

/// Errors that can occur when working with GRF archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] midgard_common::Error),

    /// The handle already holds an open archive.
    #[error("archive is already open")]
    AlreadyOpen,

    /// The handle has no open archive.
    #[error("archive is not open")]
    NotOpen,

    /// The 16-byte signature did not match.
    #[error("invalid GRF signature: {actual:?}")]
    InvalidSignature { actual: Vec<u8> },

    /// The file ends before the file table.
    #[error("file truncated before the file table")]
    TruncatedFile,

    /// The compressed file table could not be inflated to its declared size.
    #[error("failed to decompress file table: {0}")]
    HeaderDecompression(String),

    /// The version tag selects a table layout this reader does not know.
    #[error("unsupported GRF version: {0:02x?}")]
    UnsupportedVersion([u8; 4]),

    /// A file table record is malformed.
    #[error("corrupt file table at entry {index}: {reason}")]
    CorruptTable { index: usize, reason: String },

    /// Entry not found.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// Payload decryption or decompression produced unexpected output.
    #[error("failed to decode {name}: {reason}")]
    Decode { name: String, reason: String },
}

impl Error {
    /// Numeric status code for open-time failures.
    ///
    /// Returns `None` for errors that can only occur after the archive is
    /// open (lookup and decode failures).
    pub fn status_code(&self) -> Option<u8> {
        match self {
            Error::AlreadyOpen => Some(1),
            Error::Io(_) | Error::Common(_) => Some(2),
            Error::InvalidSignature { .. } => Some(3),
            Error::TruncatedFile => Some(4),
            Error::HeaderDecompression(_) => Some(5),
            Error::UnsupportedVersion(_) => Some(6),
            Error::CorruptTable { .. } => Some(7),
            Error::NotOpen | Error::EntryNotFound(_) | Error::Decode { .. } => None,
        }
    }
}

/// Result type for GRF operations.
pub type Result<T> = std::result::Result<T, Error>;
