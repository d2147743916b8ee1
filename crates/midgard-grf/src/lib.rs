//! GRF archive reader for legacy game client asset packs.
//!
//! A GRF archive packs many named assets (sprites, maps, strings) into one
//! file. The format supports:
//!
//! - Two file table layouts: legacy (v1, `0x01`) with obfuscated names and
//!   biased sizes, and compressed (v2, `0x02`) with a zlib-packed table
//! - Per-entry zlib compression
//! - A keyless DES-based cipher, either over the first 20 blocks of a
//!   payload or mixed through it at an interval derived from the entry size
//!
//! # Example
//!
//! ```no_run
//! use midgard_grf::GrfArchive;
//!
//! let archive = GrfArchive::open("data.grf")?;
//!
//! for entry in archive.iter() {
//!     println!("{}: {} bytes", entry.name(), entry.uncompressed_size());
//! }
//!
//! if archive.exists("data\\clientinfo.xml") {
//!     let data = archive.get_contents("data\\clientinfo.xml")?;
//! }
//! # Ok::<(), midgard_grf::Error>(())
//! ```

mod archive;
mod crypto;
mod decompress;
mod entry;
mod error;
mod header;
mod table;

#[cfg(test)]
mod fixture;

pub use archive::GrfArchive;
pub use crypto::{Decryptor, GrfCipher};
pub use decompress::{decompress_zlib_sized, InflateError, Inflater, ZlibInflater};
pub use entry::{cycle_for_size, uses_header_only_cipher, EntryFlags, GrfEntry};
pub use error::{Error, Result};
pub use header::{GrfHeader, TableVersion};
pub use table::MAX_NAME_LEN;
