//! GRF archive entry.

use std::path::{Path, PathBuf};

use crate::header::GrfHeader;

/// Extensions of legacy entries that only carry header encryption.
const HEADER_ONLY_EXTENSIONS: [&str; 4] = [".act", ".gat", ".gnd", ".str"];

/// Encryption kind recorded in a file table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFlags {
    /// No flag set.
    None,
    /// Plain file; the default for unmarked legacy entries.
    MixCrypt,
    /// Mixed DES encryption keyed by the cycle count.
    Des,
    /// Header-only DES encryption.
    Unknown,
    /// Any other raw flag value, kept as stored.
    Other(u8),
}

impl EntryFlags {
    /// Raw flag value for [`EntryFlags::None`].
    pub const NONE: u8 = 0x00;
    /// Raw flag value for [`EntryFlags::MixCrypt`].
    pub const MIXCRYPT: u8 = 0x01;
    /// Raw flag value for [`EntryFlags::Des`].
    pub const DES: u8 = 0x03;
    /// Raw flag value for [`EntryFlags::Unknown`].
    pub const UNKNOWN: u8 = 0x05;

    /// Interpret a raw flag byte.
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            Self::NONE => Self::None,
            Self::MIXCRYPT => Self::MixCrypt,
            Self::DES => Self::Des,
            Self::UNKNOWN => Self::Unknown,
            other => Self::Other(other),
        }
    }

    /// The raw flag byte.
    pub const fn raw(self) -> u8 {
        match self {
            Self::None => Self::NONE,
            Self::MixCrypt => Self::MIXCRYPT,
            Self::Des => Self::DES,
            Self::Unknown => Self::UNKNOWN,
            Self::Other(raw) => raw,
        }
    }

    /// Whether payloads with this flag are encrypted in any archive version.
    #[inline]
    pub const fn is_encrypted(self) -> bool {
        matches!(self, Self::Des | Self::Unknown)
    }
}

/// Cycle count for a compressed size: its number of decimal digits.
pub fn cycle_for_size(compressed_size: u32) -> u32 {
    let mut digits = 1;
    let mut bound = 10u64;
    while u64::from(compressed_size) >= bound {
        bound *= 10;
        digits += 1;
    }
    digits
}

/// Whether a legacy entry name carries only header encryption.
///
/// Compares the text from the last `.` with a fixed set of extensions,
/// case-sensitively. Names without a dot never match.
pub fn uses_header_only_cipher(name: &str) -> bool {
    name.rfind('.')
        .map(|dot| HEADER_ONLY_EXTENSIONS.contains(&&name[dot..]))
        .unwrap_or(false)
}

/// Decode a raw table name into text.
#[cfg(feature = "euc-kr")]
pub(crate) fn decode_name(raw: &[u8]) -> String {
    let (name, _) = encoding_rs::EUC_KR.decode_without_bom_handling(raw);
    name.into_owned()
}

/// Decode a raw table name into text.
#[cfg(not(feature = "euc-kr"))]
pub(crate) fn decode_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// An entry (file) within a GRF archive.
///
/// This contains metadata about the file, not the file data itself.
/// Use [`GrfArchive::read_entry`](crate::GrfArchive::read_entry) to get the
/// actual file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrfEntry {
    /// File name/path within the archive.
    name: String,
    /// True compressed length.
    compressed_size: u32,
    /// Padded length occupied on disk.
    compressed_aligned_size: u32,
    /// Size after decompression.
    uncompressed_size: u32,
    /// Encryption kind.
    flags: EntryFlags,
    /// Payload offset relative to the end of the header.
    offset: u32,
    /// Mixed-cipher cycle count, 0 when not applicable.
    cycle: u32,
}

impl GrfEntry {
    /// Create a new GRF entry.
    pub(crate) fn new(
        name: String,
        compressed_size: u32,
        compressed_aligned_size: u32,
        uncompressed_size: u32,
        flags: EntryFlags,
        offset: u32,
        cycle: u32,
    ) -> Self {
        Self {
            name,
            compressed_size,
            compressed_aligned_size,
            uncompressed_size,
            flags,
            offset,
            cycle,
        }
    }

    /// Get the file name/path.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the true compressed size in bytes.
    #[inline]
    pub fn compressed_size(&self) -> u32 {
        self.compressed_size
    }

    /// Get the aligned on-disk size in bytes.
    #[inline]
    pub fn compressed_aligned_size(&self) -> u32 {
        self.compressed_aligned_size
    }

    /// Get the uncompressed size in bytes.
    #[inline]
    pub fn uncompressed_size(&self) -> u32 {
        self.uncompressed_size
    }

    /// Get the encryption flags.
    #[inline]
    pub fn flags(&self) -> EntryFlags {
        self.flags
    }

    /// Get the payload offset relative to the end of the header.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Get the cycle count used for mixed decryption.
    #[inline]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Whether the flags alone mark this payload as encrypted.
    ///
    /// Legacy archives encrypt every payload regardless of this value.
    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.flags.is_encrypted()
    }

    /// Absolute file position of the payload.
    #[inline]
    pub fn payload_offset(&self) -> u64 {
        GrfHeader::SIZE + u64::from(self.offset)
    }

    /// Get the relative output path for extraction.
    ///
    /// Converts Windows path separators to the platform's native separator.
    pub fn output_path(&self) -> PathBuf {
        let normalized = self.name.replace('\\', "/");
        PathBuf::from(normalized)
    }

    /// Get the file extension, if any.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
    }
}
