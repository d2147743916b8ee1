//! Synthetic GRF archives for tests.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::crypto::GrfCipher;
use crate::entry::{cycle_for_size, uses_header_only_cipher, EntryFlags};
use crate::header::{GrfHeader, TableVersion};
use crate::table::LegacyTable;

/// Deterministic, poorly compressible bytes.
pub(crate) fn sample_data(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9) | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

struct FixtureFile {
    name: String,
    data: Vec<u8>,
    flag: u8,
}

/// Builds archive bytes the way the GRF encoder lays them out.
pub(crate) struct ArchiveBuilder {
    version: TableVersion,
    files: Vec<FixtureFile>,
}

impl ArchiveBuilder {
    pub fn v1() -> Self {
        Self {
            version: TableVersion::V1,
            files: Vec::new(),
        }
    }

    pub fn v2() -> Self {
        Self {
            version: TableVersion::V2,
            files: Vec::new(),
        }
    }

    pub fn file(mut self, name: &str, data: Vec<u8>, flag: u8) -> Self {
        self.files.push(FixtureFile {
            name: name.to_string(),
            data,
            flag,
        });
        self
    }

    /// Cycle the reader will derive for this record.
    fn cycle(&self, file: &FixtureFile, compressed_size: u32) -> u32 {
        match self.version {
            TableVersion::V1 if file.flag == EntryFlags::NONE => 0,
            TableVersion::V1 if uses_header_only_cipher(&file.name) => 0,
            TableVersion::V1 => cycle_for_size(compressed_size),
            TableVersion::V2 if file.flag == EntryFlags::DES => cycle_for_size(compressed_size),
            TableVersion::V2 => 0,
        }
    }

    fn is_encrypted(&self, file: &FixtureFile) -> bool {
        self.version == TableVersion::V1 || EntryFlags::from_raw(file.flag).is_encrypted()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut payloads = Vec::new();
        let mut table = Vec::new();

        for file in &self.files {
            let compressed = zlib(&file.data);
            let compressed_size = compressed.len() as u32;
            let mut payload = compressed;
            payload.resize(payload.len().div_ceil(8) * 8, 0);
            let aligned_size = payload.len() as u32;

            if self.is_encrypted(file) {
                GrfCipher.encode_content(&mut payload, self.cycle(file, compressed_size));
            }

            let offset = payloads.len() as u32;
            payloads.extend_from_slice(&payload);

            let uncompressed_size = file.data.len() as u32;
            match self.version {
                TableVersion::V1 => {
                    let mut raw_name = file.name.as_bytes().to_vec();
                    raw_name.push(0);
                    raw_name.resize(raw_name.len().div_ceil(8) * 8, 0);
                    GrfCipher.encode_filename(&mut raw_name);

                    table.extend_from_slice(&(raw_name.len() as u32 + 6).to_le_bytes());
                    table.extend_from_slice(&[0, 0]);
                    table.extend_from_slice(&raw_name);
                    table.extend_from_slice(&[0; 4]);
                    let packed_compressed =
                        compressed_size + uncompressed_size + LegacyTable::COMPRESSED_BIAS;
                    table.extend_from_slice(&packed_compressed.to_le_bytes());
                    table.extend_from_slice(
                        &(aligned_size + LegacyTable::ALIGNED_BIAS).to_le_bytes(),
                    );
                    table.extend_from_slice(&uncompressed_size.to_le_bytes());
                }
                TableVersion::V2 => {
                    table.extend_from_slice(file.name.as_bytes());
                    table.push(0);
                    table.extend_from_slice(&compressed_size.to_le_bytes());
                    table.extend_from_slice(&aligned_size.to_le_bytes());
                    table.extend_from_slice(&uncompressed_size.to_le_bytes());
                }
            }
            table.push(file.flag);
            table.extend_from_slice(&offset.to_le_bytes());
        }

        let mut bytes = Vec::new();
        bytes.extend_from_slice(GrfHeader::SIGNATURE);
        bytes.push(0);
        bytes.extend_from_slice(&[0; 14]);
        bytes.extend_from_slice(&(payloads.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        let raw_count = self.files.len() as u32 + GrfHeader::RESERVED_FILES;
        bytes.extend_from_slice(&raw_count.to_le_bytes());
        let major = match self.version {
            TableVersion::V1 => 0x01,
            TableVersion::V2 => 0x02,
        };
        bytes.extend_from_slice(&[0x00, major, 0x00, 0x00]);
        assert_eq!(bytes.len() as u64, GrfHeader::SIZE);

        bytes.extend_from_slice(&payloads);
        match self.version {
            TableVersion::V1 => bytes.extend_from_slice(&table),
            TableVersion::V2 => {
                let compressed = zlib(&table);
                bytes.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
                bytes.extend_from_slice(&(table.len() as u32).to_le_bytes());
                bytes.extend_from_slice(&compressed);
            }
        }
        bytes
    }

    pub fn write_temp(&self) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&self.build()).unwrap();
        file.flush().unwrap();
        file
    }
}
