//! GRF archive reader.
//!
//! Opening an archive consumes the header and file table; afterwards each
//! content read seeks to its payload on the shared file handle, which is
//! guarded by a mutex so reads through `&self` are serialized.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::crypto::{Decryptor, GrfCipher};
use crate::decompress::{Inflater, ZlibInflater};
use crate::entry::GrfEntry;
use crate::header::{GrfHeader, TableVersion};
use crate::table;
use crate::{Error, Result};

/// GRF archive reader.
///
/// A handle is either open, holding the file and its decoded index, or
/// closed. The index is immutable once the archive is open.
pub struct GrfArchive {
    /// Open file, `None` when closed
    file: Option<Mutex<File>>,
    /// Length of the open file
    file_len: u64,
    /// Archive file name
    name: String,
    /// Raw version tag from the header
    version: [u8; 4],
    /// Entry metadata in table order
    entries: Vec<GrfEntry>,
    decryptor: Box<dyn Decryptor + Send + Sync>,
    inflater: Box<dyn Inflater + Send + Sync>,
}

impl GrfArchive {
    /// Create a closed handle using the GRF cipher and zlib.
    pub fn new() -> Self {
        Self::with_providers(GrfCipher, ZlibInflater)
    }

    /// Create a closed handle with custom decryption and decompression.
    pub fn with_providers<D, I>(decryptor: D, inflater: I) -> Self
    where
        D: Decryptor + Send + Sync + 'static,
        I: Inflater + Send + Sync + 'static,
    {
        Self {
            file: None,
            file_len: 0,
            name: String::new(),
            version: [0; 4],
            entries: Vec::new(),
            decryptor: Box::new(decryptor),
            inflater: Box::new(inflater),
        }
    }

    /// Open a GRF archive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut archive = Self::new();
        archive.load(path)?;
        Ok(archive)
    }

    /// Open an archive on this handle.
    ///
    /// Fails with [`Error::AlreadyOpen`] if the handle is in use. On any
    /// other failure the handle stays closed.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        if self.is_open() {
            return Err(Error::AlreadyOpen);
        }

        let path = path.as_ref();
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let header = GrfHeader::read(&mut reader)?;
        let version = header.table_version()?;
        let file_count = header.file_count();
        debug!(
            "{}: version {:02x?}, {} entries, table at +{}",
            path.display(),
            header.version_tag(),
            file_count,
            header.table_offset()
        );

        // The table offset counts from the end of the header.
        let table_offset = u64::from(header.table_offset());
        if GrfHeader::SIZE + table_offset > file_len {
            return Err(Error::TruncatedFile);
        }
        reader.seek(SeekFrom::Current(table_offset as i64))?;

        let flat = table::read_table(&mut reader, version, file_len, self.inflater.as_ref())?;
        let entries = table::decode_entries(&flat, version, file_count, self.decryptor.as_ref())?;

        self.name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        self.version = header.version_tag();
        self.entries = entries;
        self.file_len = file_len;
        self.file = Some(Mutex::new(reader.into_inner()));

        Ok(())
    }

    /// Close the archive, releasing the file and index.
    ///
    /// Safe to call on a handle that is already closed or never opened.
    pub fn close(&mut self) {
        self.file = None;
        self.file_len = 0;
        self.entries = Vec::new();
    }

    /// Check whether the handle holds an open archive.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Get the archive name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw four-byte version tag of the last opened archive.
    #[inline]
    pub fn version_tag(&self) -> [u8; 4] {
        self.version
    }

    /// Table layout of the open archive.
    pub fn version(&self) -> Option<TableVersion> {
        if !self.is_open() {
            return None;
        }
        TableVersion::from_tag(self.version).ok()
    }

    /// Get the number of entries.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// All entries in table order.
    #[inline]
    pub fn entries(&self) -> &[GrfEntry] {
        &self.entries
    }

    /// Iterate over entries in table order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &GrfEntry> + '_ {
        self.entries.iter()
    }

    /// Get entry by index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&GrfEntry> {
        self.entries.get(index)
    }

    /// Find the first entry with exactly this name (case-sensitive).
    pub fn find(&self, name: &str) -> Option<&GrfEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Check whether any entry has exactly this name.
    pub fn exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Read, decrypt and decompress the first entry with this name.
    pub fn get_contents(&self, name: &str) -> Result<Vec<u8>> {
        if !self.is_open() {
            return Err(Error::NotOpen);
        }
        let entry = self
            .find(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        self.read_entry(entry)
    }

    /// Read entry contents - handles decryption and decompression.
    pub fn read_entry(&self, entry: &GrfEntry) -> Result<Vec<u8>> {
        let file = self.file.as_ref().ok_or(Error::NotOpen)?;

        let start = entry.payload_offset();
        let aligned = u64::from(entry.compressed_aligned_size());
        if start + aligned > self.file_len {
            return Err(decode_error(entry, "payload extends past end of file"));
        }

        let mut payload = vec![0u8; aligned as usize];
        {
            let mut file = file.lock();
            file.seek(SeekFrom::Start(start))
                .map_err(|e| decode_error(entry, e.to_string()))?;
            file.read_exact(&mut payload)
                .map_err(|e| decode_error(entry, e.to_string()))?;
        }

        if entry.flags().is_encrypted() || self.version() == Some(TableVersion::V1) {
            self.decryptor.decode_content(&mut payload, entry.cycle());
        }

        let data = self
            .inflater
            .inflate(&payload, entry.uncompressed_size() as usize)
            .map_err(|e| {
                warn!("{}: {}", entry.name(), e);
                decode_error(entry, e.to_string())
            })?;

        debug!(
            "read {}: {} -> {} bytes",
            entry.name(),
            entry.compressed_aligned_size(),
            data.len()
        );
        Ok(data)
    }
}

fn decode_error(entry: &GrfEntry, reason: impl Into<String>) -> Error {
    Error::Decode {
        name: entry.name().to_string(),
        reason: reason.into(),
    }
}

impl Default for GrfArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GrfArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrfArchive")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .field("version", &self.version)
            .field("entries", &self.entries.len())
            .finish()
    }
}
