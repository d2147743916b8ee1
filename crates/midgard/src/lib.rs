//! Midgard - legacy game client asset archive library.
//!
//! This crate provides a unified interface to the Midgard crates.
//!
//! # Crates
//!
//! - [`midgard_common`] - Common utilities (binary reading, shared errors)
//! - [`midgard_grf`] - GRF archive reading (v1 and v2 tables, DES + zlib)
//!
//! # Example
//!
//! ```no_run
//! use midgard::prelude::*;
//!
//! let archive = GrfArchive::open("data.grf")?;
//!
//! if let Some(entry) = archive.find("data\\clientinfo.xml") {
//!     let data = archive.read_entry(entry)?;
//!     println!("{}: {} bytes", entry.name(), data.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use midgard_common as common;
pub use midgard_grf as grf;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use midgard_common::BinaryReader;
    pub use midgard_grf::{EntryFlags, GrfArchive, GrfEntry, TableVersion};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
