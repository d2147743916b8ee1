//! GRF header structure.

use std::io::{self, Read};

use midgard_common::ReadExt;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// File table layout, selected by the second byte of the version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableVersion {
    /// Uncompressed table with obfuscated names and biased sizes.
    V1,
    /// zlib-compressed table with plain records.
    V2,
}

impl TableVersion {
    /// Select the table layout from a raw version tag.
    pub fn from_tag(tag: [u8; 4]) -> Result<Self> {
        match tag[1] {
            0x01 => Ok(Self::V1),
            0x02 => Ok(Self::V2),
            _ => Err(Error::UnsupportedVersion(tag)),
        }
    }
}

/// GRF archive header.
///
/// The fixed 46-byte preamble at the start of every archive.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct GrfHeader {
    /// NUL-padded ASCII signature
    pub signature: [u8; 16],
    /// Encryption-allow region, not interpreted
    pub encryption: [u8; 14],
    /// Distance from the end of the header to the file table
    pub table_offset: U32,
    /// First file counter
    pub seed: U32,
    /// Second file counter
    pub raw_file_count: U32,
    /// Version tag
    pub version: [u8; 4],
}

impl GrfHeader {
    /// Header size in bytes; payload offsets are relative to this.
    pub const SIZE: u64 = 46;

    /// Signature text, compared as a C string.
    pub const SIGNATURE: &'static [u8] = b"Master of Magic";

    /// Correction between the stored counters and the real entry count.
    pub const RESERVED_FILES: u32 = 7;

    /// Read and validate the header from the start of a stream.
    ///
    /// Checks the signature; the version tag is validated separately by
    /// [`table_version`](Self::table_version).
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let header: GrfHeader = reader.read_struct().map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::TruncatedFile,
            _ => Error::Io(e),
        })?;

        if !header.has_valid_signature() {
            return Err(Error::InvalidSignature {
                actual: header.signature.to_vec(),
            });
        }

        Ok(header)
    }

    /// Compare the signature up to its first NUL byte.
    pub fn has_valid_signature(&self) -> bool {
        let signature = self.signature;
        let end = signature.iter().position(|&b| b == 0).unwrap_or(signature.len());
        &signature[..end] == Self::SIGNATURE
    }

    /// Offset of the file table relative to the end of the header.
    pub fn table_offset(&self) -> u32 {
        self.table_offset.get()
    }

    /// Number of entries in the file table.
    ///
    /// Wrapping arithmetic matches the encoder; a nonsensical result is
    /// caught when the table runs out of records.
    pub fn file_count(&self) -> u32 {
        self.raw_file_count
            .get()
            .wrapping_sub(self.seed.get())
            .wrapping_sub(Self::RESERVED_FILES)
    }

    /// Raw four-byte version tag.
    pub fn version_tag(&self) -> [u8; 4] {
        self.version
    }

    /// Table layout selected by the version tag.
    pub fn table_version(&self) -> Result<TableVersion> {
        TableVersion::from_tag(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_bytes(signature: &[u8], seed: u32, count: u32, version: [u8; 4]) -> Vec<u8> {
        let mut bytes = vec![0u8; 16];
        bytes[..signature.len()].copy_from_slice(signature);
        bytes.extend_from_slice(&[0u8; 14]);
        bytes.extend_from_slice(&0x1234u32.to_le_bytes());
        bytes.extend_from_slice(&seed.to_le_bytes());
        bytes.extend_from_slice(&count.to_le_bytes());
        bytes.extend_from_slice(&version);
        bytes
    }

    #[test]
    fn test_header_size() {
        assert_eq!(std::mem::size_of::<GrfHeader>() as u64, GrfHeader::SIZE);
    }

    #[test]
    fn test_read_valid_header() {
        let bytes = header_bytes(b"Master of Magic", 3, 3 + 7 + 42, [0x00, 0x02, 0x00, 0x00]);
        let header = GrfHeader::read(&mut Cursor::new(bytes)).unwrap();

        assert_eq!(header.table_offset(), 0x1234);
        assert_eq!(header.file_count(), 42);
        assert_eq!(header.table_version().unwrap(), TableVersion::V2);
    }

    #[test]
    fn test_bad_signature() {
        let bytes = header_bytes(b"Master of Mana", 0, 7, [0x00, 0x02, 0x00, 0x00]);
        let err = GrfHeader::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::InvalidSignature { .. }));
    }

    #[test]
    fn test_signature_requires_terminator() {
        let bytes = header_bytes(b"Master of Magicx", 0, 7, [0x00, 0x01, 0x00, 0x00]);
        let err = GrfHeader::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::InvalidSignature { .. }));
    }

    #[test]
    fn test_unsupported_version() {
        let bytes = header_bytes(b"Master of Magic", 0, 7, [0x00, 0x03, 0x00, 0x00]);
        let header = GrfHeader::read(&mut Cursor::new(bytes)).unwrap();
        assert!(matches!(
            header.table_version(),
            Err(Error::UnsupportedVersion([0x00, 0x03, 0x00, 0x00]))
        ));
    }

    #[test]
    fn test_short_file_is_truncated() {
        let bytes = b"Master of Magic\0".to_vec();
        let err = GrfHeader::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::TruncatedFile));
    }

    #[test]
    fn test_file_count_wraps_like_encoder() {
        let bytes = header_bytes(b"Master of Magic", 0, 7, [0x00, 0x01, 0x00, 0x00]);
        let header = GrfHeader::read(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(header.file_count(), 0);

        let bytes = header_bytes(b"Master of Magic", 0, 6, [0x00, 0x01, 0x00, 0x00]);
        let header = GrfHeader::read(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(header.file_count(), u32::MAX);
    }
}
