//! Binary reader for zero-copy parsing of byte slices.
//!
//! This module provides [`BinaryReader`], a cursor-like type that efficiently
//! reads binary data from a byte slice without copying, and [`ReadExt`] for
//! pulling fixed-layout structures out of a stream.

use std::io::{self, Read};

use byteorder::{ByteOrder, LittleEndian};
use zerocopy::FromBytes;

use crate::{Error, Result};

/// A binary reader that provides zero-copy reading from a byte slice.
///
/// All multi-byte integers are little-endian.
///
/// # Example
///
/// ```
/// use midgard_common::BinaryReader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
/// assert_eq!(reader.read_u32().unwrap(), 0x08070605);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Skip a number of bytes, failing if fewer remain.
    #[inline]
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bytes(2).map(LittleEndian::read_u16)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bytes(4).map(LittleEndian::read_u32)
    }

    /// Read a null-terminated byte string of at most `max` bytes,
    /// terminator included.
    ///
    /// Returns the bytes before the terminator and advances past it.
    pub fn read_cstring_bounded(&mut self, max: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining_bytes();
        let window = &remaining[..remaining.len().min(max)];

        match memchr::memchr(0, window) {
            Some(null_pos) => {
                self.position += null_pos + 1;
                Ok(&window[..null_pos])
            }
            None if window.len() == max => Err(Error::StringTooLong { max }),
            None => Err(Error::MissingNullTerminator),
        }
    }
}

/// Trait for reading binary data from streams.
///
/// This extends `Read` with methods for reading fixed-size structures.
pub trait ReadExt: Read {
    /// Read a structure from the stream.
    fn read_struct<T: FromBytes>(&mut self) -> io::Result<T> {
        let size = std::mem::size_of::<T>();
        let mut bytes = vec![0u8; size];
        self.read_exact(&mut bytes)?;
        T::read_from_bytes(&bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{:?}", e)))
    }

    /// Read exactly `len` bytes into a new buffer.
    fn read_vec(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}

impl<R: Read> ReadExt for R {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let data = [
            0x01u8, 0x02, 0x03, 0x04, // u32: 0x04030201
            0xFF, 0xFF, 0xFF, 0xFF, // u32: 0xFFFFFFFF
            0x34, 0x12, // u16: 0x1234
        ];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u32().unwrap(), 0x04030201);
        assert_eq!(reader.read_u32().unwrap(), 0xFFFFFFFF);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_cstring_bounded() {
        let data = b"hello\0world\0";
        let mut reader = BinaryReader::new(data);

        assert_eq!(reader.read_cstring_bounded(16).unwrap(), b"hello");
        assert_eq!(reader.read_cstring_bounded(6).unwrap(), b"world");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_cstring_too_long() {
        let data = b"abcdefgh\0";
        let mut reader = BinaryReader::new(data);

        assert!(matches!(
            reader.read_cstring_bounded(8),
            Err(Error::StringTooLong { max: 8 })
        ));
        // Position is untouched on failure.
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_read_cstring_unterminated() {
        let mut reader = BinaryReader::new(b"abc");
        assert!(matches!(
            reader.read_cstring_bounded(16),
            Err(Error::MissingNullTerminator)
        ));
    }

    #[test]
    fn test_skip_checks_bounds() {
        let data = [0u8; 4];
        let mut reader = BinaryReader::new(&data);

        reader.skip(3).unwrap();
        assert_eq!(reader.remaining(), 1);
        assert!(reader.skip(2).is_err());
    }

    #[test]
    fn test_read_ext_vec() {
        let mut cursor = std::io::Cursor::new(vec![1u8, 2, 3]);
        assert_eq!(cursor.read_vec(2).unwrap(), vec![1, 2]);
        assert!(cursor.read_vec(2).is_err());
    }

    #[test]
    fn test_eof_error() {
        let data = [0x01, 0x02];
        let mut reader = BinaryReader::new(&data);

        assert!(reader.read_u32().is_err());
    }
}
