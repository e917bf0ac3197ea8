//! # Cassette Core
//!
//! Core components for the Cassette archive library.
//!
//! A cassette is a directory tree packed into a compact bitstream and
//! carried as the sample data of an 8-bit PCM WAVE file. This crate holds
//! the bit-exact codec:
//!
//! - [`bitstream`]: Buffered MSB-first bit I/O with frame accounting
//! - [`varwidth`]: 8-bucket prefix-coded unsigned integers
//! - [`packed`]: 7-bit packed, ETX-terminated strings
//! - [`entry`]: Archive entries and the entry codec
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: CLI                                                 │
//! │     write / contents / extract / test                   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     RIFF/WAVE framing, archive count, builder, index    │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec (this crate)                                  │
//! │     Entry, VarWidth integers, packed strings            │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     BitSink/BitSource                                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cassette_core::bitstream::{BitSink, BitSource};
//! use cassette_core::entry::{self, ReadMode};
//! use std::io::Cursor;
//!
//! let mut output = Vec::new();
//! let mut sink = BitSink::new(&mut output);
//! entry::write_entry(&mut sink, "hello.txt", false, b"Hi").unwrap();
//! sink.finish().unwrap();
//!
//! let mut source = BitSource::new(Cursor::new(output));
//! let entry = entry::read_entry(&mut source, ReadMode::Full).unwrap();
//! assert_eq!(entry.name, "hello.txt");
//! assert_eq!(entry.content(), Some(&b"Hi"[..]));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod entry;
pub mod error;
pub mod packed;
pub mod varwidth;

// Re-exports for convenience
pub use bitstream::{BitSink, BitSource, Refill};
pub use entry::{Entry, ReadMode};
pub use error::{CassetteError, Result};
pub use packed::{ETX, NAK};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::{BitSink, BitSource, Refill};
    pub use crate::entry::{Entry, ReadMode};
    pub use crate::error::{CassetteError, Result};
}
