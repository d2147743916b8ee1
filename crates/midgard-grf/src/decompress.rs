//! Decompression utilities for GRF archives.
//!
//! Both the v2 file table and entry payloads are zlib streams. The stored
//! buffer may carry alignment padding after the end of the stream.

use std::io::Read;

use flate2::read::ZlibDecoder;
use thiserror::Error;

/// Largest expansion a DEFLATE stream can achieve per input byte.
const MAX_DEFLATE_RATIO: usize = 1032;

/// Errors reported by an [`Inflater`].
#[derive(Debug, Error)]
pub enum InflateError {
    /// The compressed stream is malformed or truncated.
    #[error("corrupt zlib stream: {0}")]
    Stream(String),

    /// The stream decoded to a different size than declared.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Inflates compressed buffers into outputs of a caller-declared size.
pub trait Inflater {
    /// Inflate `data`, which must decode to exactly `expected_len` bytes.
    fn inflate(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>, InflateError>;
}

/// zlib inflater backed by `flate2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibInflater;

impl Inflater for ZlibInflater {
    fn inflate(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>, InflateError> {
        decompress_zlib_sized(data, expected_len)
    }
}

/// Decompress zlib data that must produce exactly `expected_size` bytes.
///
/// Output is capped one byte past the declared size so oversized streams are
/// detected without decoding them completely.
pub fn decompress_zlib_sized(data: &[u8], expected_size: usize) -> Result<Vec<u8>, InflateError> {
    let capacity = expected_size.min(data.len().saturating_mul(MAX_DEFLATE_RATIO));
    let mut output = Vec::with_capacity(capacity);

    let limit = (expected_size as u64).saturating_add(1);
    ZlibDecoder::new(data)
        .take(limit)
        .read_to_end(&mut output)
        .map_err(|e| InflateError::Stream(e.to_string()))?;

    if output.len() != expected_size {
        return Err(InflateError::SizeMismatch {
            expected: expected_size,
            actual: output.len(),
        });
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_zlib_roundtrip() {
        let original = b"Hello, World! This is a test of zlib compression.";
        let compressed = compress(original);

        let decompressed = ZlibInflater.inflate(&compressed, original.len()).unwrap();

        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_trailing_padding_ignored() {
        let original = vec![0x42u8; 300];
        let mut compressed = compress(&original);
        compressed.extend_from_slice(&[0xAA; 7]);

        let decompressed = decompress_zlib_sized(&compressed, original.len()).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_short_output_rejected() {
        let original = vec![1u8; 100];
        let compressed = compress(&original);

        let err = decompress_zlib_sized(&compressed, 101).unwrap_err();
        assert!(matches!(
            err,
            InflateError::SizeMismatch {
                expected: 101,
                actual: 100
            }
        ));
    }

    #[test]
    fn test_oversized_output_rejected() {
        let original = vec![1u8; 100];
        let compressed = compress(&original);

        let err = decompress_zlib_sized(&compressed, 50).unwrap_err();
        assert!(matches!(
            err,
            InflateError::SizeMismatch {
                expected: 50,
                actual: 51
            }
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let err = decompress_zlib_sized(&[0xFF; 32], 16).unwrap_err();
        assert!(matches!(err, InflateError::Stream(_)));
    }

    #[test]
    fn test_empty_payload() {
        let compressed = compress(&[]);
        assert!(decompress_zlib_sized(&compressed, 0).unwrap().is_empty());
    }
}
