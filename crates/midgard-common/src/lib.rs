//! Common utilities for Midgard.
//!
//! This crate provides the foundational pieces shared by the Midgard crates:
//!
//! - [`BinaryReader`] - Zero-copy little-endian reading from byte slices
//! - [`ReadExt`] - Fixed-layout struct reads from any [`std::io::Read`]
//! - [`Error`] - Errors raised while reading binary data

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::{BinaryReader, ReadExt};
