//! GRF file table decoding.
//!
//! The table region is first materialized into a flat buffer (verbatim for
//! v1, inflated for v2), then walked record by record with the
//! [`TableFormat`] chosen once for the archive's version.

use std::io::{Read, Seek};

use byteorder::{LittleEndian, ReadBytesExt};
use midgard_common::{BinaryReader, ReadExt};
use tracing::{debug, trace};

use crate::crypto::Decryptor;
use crate::decompress::Inflater;
use crate::entry::{cycle_for_size, decode_name, uses_header_only_cipher, EntryFlags, GrfEntry};
use crate::header::TableVersion;
use crate::{Error, Result};

/// Longest v2 entry name accepted, terminator included.
pub const MAX_NAME_LEN: usize = 256;

/// Smallest possible v2 record: an empty name plus the fixed fields.
const MIN_V2_RECORD: usize = 1 + 4 * 3 + 1 + 4;

/// Decodes one file table record.
pub(crate) trait TableFormat {
    /// Read the record at the reader's position.
    fn read_entry(&self, reader: &mut BinaryReader<'_>) -> Result<GrfEntry>;
}

/// Legacy (v1) records: obfuscated names and biased size fields.
pub(crate) struct LegacyTable<'a> {
    decryptor: &'a dyn Decryptor,
}

impl<'a> LegacyTable<'a> {
    /// Bias added to the stored compressed size.
    pub const COMPRESSED_BIAS: u32 = 0x02CB;

    /// Bias added to the stored aligned size.
    pub const ALIGNED_BIAS: u32 = 0x92CB;

    /// Bytes of the length field and the skip that follows it.
    const NAME_PREFIX: u32 = 6;

    pub fn new(decryptor: &'a dyn Decryptor) -> Self {
        Self { decryptor }
    }
}

impl TableFormat for LegacyTable<'_> {
    fn read_entry(&self, reader: &mut BinaryReader<'_>) -> Result<GrfEntry> {
        let length = reader.read_u32()?;
        let name_len = length
            .checked_sub(Self::NAME_PREFIX)
            .ok_or_else(|| corrupt(reader, format!("name length field {length} too small")))?;
        reader.skip(2)?;

        let mut raw_name = reader.read_bytes(name_len as usize)?.to_vec();
        self.decryptor.decode_filename(&mut raw_name);
        if let Some(nul) = raw_name.iter().position(|&b| b == 0) {
            raw_name.truncate(nul);
        }
        let name = decode_name(&raw_name);

        reader.skip(4)?;
        let packed_compressed = reader.read_u32()?;
        let packed_aligned = reader.read_u32()?;
        let uncompressed_size = reader.read_u32()?;

        let compressed_size = packed_compressed
            .wrapping_sub(uncompressed_size)
            .wrapping_sub(Self::COMPRESSED_BIAS);
        let compressed_aligned_size = packed_aligned.wrapping_sub(Self::ALIGNED_BIAS);

        let raw_flags = reader.read_u8()?;
        let offset = reader.read_u32()?;

        let (flags, cycle) = match EntryFlags::from_raw(raw_flags) {
            EntryFlags::None => (EntryFlags::MixCrypt, 0),
            flags if uses_header_only_cipher(&name) => (flags, 0),
            flags => (flags, cycle_for_size(compressed_size)),
        };

        Ok(GrfEntry::new(
            name,
            compressed_size,
            compressed_aligned_size,
            uncompressed_size,
            flags,
            offset,
            cycle,
        ))
    }
}

/// v2 records: NUL-terminated names and plain size fields.
pub(crate) struct CompressedTable;

impl TableFormat for CompressedTable {
    fn read_entry(&self, reader: &mut BinaryReader<'_>) -> Result<GrfEntry> {
        let name = match reader.read_cstring_bounded(MAX_NAME_LEN) {
            Ok(raw) => decode_name(raw),
            Err(midgard_common::Error::StringTooLong { max }) => {
                return Err(corrupt(reader, format!("name longer than {max} bytes")));
            }
            Err(e) => return Err(e.into()),
        };

        let compressed_size = reader.read_u32()?;
        let compressed_aligned_size = reader.read_u32()?;
        let uncompressed_size = reader.read_u32()?;
        let flags = EntryFlags::from_raw(reader.read_u8()?);
        let offset = reader.read_u32()?;

        let cycle = if flags == EntryFlags::Des {
            cycle_for_size(compressed_size)
        } else {
            0
        };

        Ok(GrfEntry::new(
            name,
            compressed_size,
            compressed_aligned_size,
            uncompressed_size,
            flags,
            offset,
            cycle,
        ))
    }
}

/// The record index is filled in by [`decode_with`].
fn corrupt(reader: &BinaryReader<'_>, reason: String) -> Error {
    Error::CorruptTable {
        index: 0,
        reason: format!("{reason} at table offset {}", reader.position()),
    }
}

/// Read the table region at the stream's position into a flat buffer.
///
/// `file_len` bounds reads so a corrupt length cannot force a huge
/// allocation.
pub(crate) fn read_table<R: Read + Seek>(
    reader: &mut R,
    version: TableVersion,
    file_len: u64,
    inflater: &dyn Inflater,
) -> Result<Vec<u8>> {
    let position = reader.stream_position()?;
    let remaining = file_len.saturating_sub(position);

    match version {
        TableVersion::V1 => {
            let mut table = Vec::with_capacity(remaining as usize);
            reader.read_to_end(&mut table)?;
            debug!("read {} byte legacy table", table.len());
            Ok(table)
        }
        TableVersion::V2 => {
            let (compressed_len, uncompressed_len) = read_v2_lengths(reader)?;
            debug!(
                "compressed table: {} -> {} bytes",
                compressed_len, uncompressed_len
            );

            if compressed_len == 0 || uncompressed_len == 0 {
                return Err(Error::HeaderDecompression(format!(
                    "empty table ({compressed_len} compressed, {uncompressed_len} uncompressed)"
                )));
            }
            if u64::from(compressed_len) > remaining.saturating_sub(8) {
                return Err(Error::HeaderDecompression(format!(
                    "table claims {compressed_len} bytes past end of file"
                )));
            }

            let compressed = reader
                .read_vec(compressed_len as usize)
                .map_err(|e| Error::HeaderDecompression(e.to_string()))?;

            inflater
                .inflate(&compressed, uncompressed_len as usize)
                .map_err(|e| Error::HeaderDecompression(e.to_string()))
        }
    }
}

fn read_v2_lengths<R: Read>(reader: &mut R) -> Result<(u32, u32)> {
    let lengths = reader
        .read_u32::<LittleEndian>()
        .and_then(|compressed| Ok((compressed, reader.read_u32::<LittleEndian>()?)));

    lengths.map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => Error::TruncatedFile,
        _ => Error::Io(e),
    })
}

/// Decode `count` records from a flat table buffer, in table order.
pub(crate) fn decode_entries(
    table: &[u8],
    version: TableVersion,
    count: u32,
    decryptor: &dyn Decryptor,
) -> Result<Vec<GrfEntry>> {
    match version {
        TableVersion::V1 => decode_with(&LegacyTable::new(decryptor), table, count),
        TableVersion::V2 => decode_with(&CompressedTable, table, count),
    }
}

fn decode_with<F: TableFormat>(format: &F, table: &[u8], count: u32) -> Result<Vec<GrfEntry>> {
    let count = count as usize;
    let mut entries = Vec::with_capacity(count.min(table.len() / MIN_V2_RECORD));
    let mut reader = BinaryReader::new(table);

    for index in 0..count {
        let entry = format.read_entry(&mut reader).map_err(|e| match e {
            Error::CorruptTable { reason, .. } => Error::CorruptTable { index, reason },
            other => Error::CorruptTable {
                index,
                reason: other.to_string(),
            },
        })?;
        trace!(
            "entry {}: {} ({} -> {} bytes, flags {:?}, cycle {})",
            index,
            entry.name(),
            entry.compressed_size(),
            entry.uncompressed_size(),
            entry.flags(),
            entry.cycle()
        );
        entries.push(entry);
    }

    Ok(entries)
}
