//! # Cassette Archive
//!
//! Reading and writing cassettes.
//!
//! A cassette is an archive bitstream (see [`cassette_core`] for the entry
//! codec) prefixed with its entry count and carried as the sample data of an
//! 8-bit mono PCM WAVE file:
//!
//! - [`archive`]: The archive codec over raw bitstreams
//! - [`wave`]: RIFF/WAVE framing
//! - [`filter`]: Glob filters for picking files
//! - [`builder`]: Building cassettes from directories
//! - [`index`]: Loading a cassette into a lookup table
//!
//! ## Example
//!
//! ```rust
//! use cassette_archive::{PendingEntry, read_cassette_from, write_cassette_to};
//! use cassette_archive::wave::WaveFormat;
//! use std::io::Cursor;
//!
//! let entries = vec![
//!     PendingEntry::bytes("a.txt", b"Hi".to_vec()),
//!     PendingEntry::bytes("extra.bin", vec![0xFF]).with_negative(true),
//! ];
//!
//! let mut wav = Vec::new();
//! write_cassette_to(&mut wav, &entries, WaveFormat::default()).unwrap();
//!
//! let mut names = Vec::new();
//! read_cassette_from(Cursor::new(wav), |entry| {
//!     names.push(entry.to_string());
//!     Ok(())
//! })
//! .unwrap();
//! assert_eq!(names, ["a.txt, 2 bytes", "[extra.bin], 1 bytes"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod builder;
pub mod cassette;
pub mod filter;
pub mod index;
pub mod wave;

// Re-exports
pub use archive::{
    ArchiveReader, ArchiveWriter, EntrySource, PendingEntry, assert_drained, read_archive_fully,
    scan_archive, write_archive,
};
pub use builder::CassetteBuilder;
pub use cassette::{
    read_cassette, read_cassette_from, scan_cassette, scan_cassette_from, write_cassette,
    write_cassette_to,
};
pub use filter::PathFilter;
pub use index::TrackIndex;
pub use wave::{WaveFormat, WaveReader, WaveWriter};
