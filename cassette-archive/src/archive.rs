//! Archive codec.
//!
//! An archive is a VarWidth entry count followed by that many entries:
//!
//! ```text
//! archive := count:VarWidth entry*
//! entry   := name:PackedString size:VarWidth pad-to-byte content
//! ```
//!
//! There is no index, checksum or end marker. Entries can only be read in
//! order, and the only way to notice trailing garbage is to check that the
//! stream is drained once the declared number of entries has been read.
//! [`ArchiveReader`] leaves that check to the caller
//! ([`ArchiveReader::assert_drained`]); [`read_archive_fully`] and
//! [`scan_archive`] perform it themselves.

use cassette_core::bitstream::{BitSink, BitSource};
use cassette_core::entry::{self, Entry, ReadMode};
use cassette_core::error::{CassetteError, Result};
use cassette_core::varwidth;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;

/// Where the content of a pending entry comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    /// Content already in memory.
    Bytes(Vec<u8>),
    /// A file read when the entry is written.
    File(PathBuf),
}

/// An entry waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    /// Forward-slash separated name inside the archive.
    pub name: String,
    /// Whether the entry is negative.
    pub negative: bool,
    /// Content source.
    pub source: EntrySource,
}

impl PendingEntry {
    /// Entry with in-memory content.
    pub fn bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            negative: false,
            source: EntrySource::Bytes(data.into()),
        }
    }

    /// Entry backed by a file.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            negative: false,
            source: EntrySource::File(path.into()),
        }
    }

    /// Set the negative flag.
    pub fn with_negative(mut self, negative: bool) -> Self {
        self.negative = negative;
        self
    }
}

/// Archive writer.
///
/// Call [`write_count`](Self::write_count) once, then write exactly that
/// many entries, then [`finish`](Self::finish).
#[derive(Debug)]
pub struct ArchiveWriter<W: Write> {
    sink: BitSink<W>,
    declared: Option<u64>,
    written: u64,
}

impl<W: Write> ArchiveWriter<W> {
    /// Create a new archive writer with one-byte frames.
    pub fn new(writer: W) -> Self {
        Self::from_sink(BitSink::new(writer))
    }

    /// Create a new archive writer over an existing sink.
    pub fn from_sink(sink: BitSink<W>) -> Self {
        Self {
            sink,
            declared: None,
            written: 0,
        }
    }

    /// Entries written so far.
    pub fn entries_written(&self) -> u64 {
        self.written
    }

    /// Write the entry count.
    pub fn write_count(&mut self, count: u64) -> Result<()> {
        debug_assert!(self.declared.is_none(), "entry count written twice");
        log::debug!("Writing archive of {} entries", count);
        varwidth::write_varwidth(&mut self.sink, count)?;
        self.declared = Some(count);
        Ok(())
    }

    /// Write an entry whose content is in memory.
    pub fn write_entry(&mut self, name: &str, negative: bool, content: &[u8]) -> Result<()> {
        entry::write_entry(&mut self.sink, name, negative, content)?;
        self.written += 1;
        Ok(())
    }

    /// Write an entry whose `size` bytes of content come from `source`.
    pub fn write_entry_from<R: Read>(
        &mut self,
        name: &str,
        negative: bool,
        size: u64,
        source: R,
    ) -> Result<()> {
        entry::write_entry_from(&mut self.sink, name, negative, size, source)?;
        self.written += 1;
        Ok(())
    }

    /// Write a pending entry, opening its file if it has one.
    pub fn write_pending(&mut self, pending: &PendingEntry) -> Result<()> {
        match &pending.source {
            EntrySource::Bytes(data) => self.write_entry(&pending.name, pending.negative, data),
            EntrySource::File(path) => {
                let file = File::open(path)?;
                let size = file.metadata()?.len();
                self.write_entry_from(&pending.name, pending.negative, size, BufReader::new(file))
            }
        }
    }

    /// Pad the final frame and return the number of frames written.
    pub fn finish(mut self) -> Result<(u64, W)> {
        if self.declared != Some(self.written) {
            log::warn!(
                "Archive declared {:?} entries but {} were written",
                self.declared,
                self.written
            );
        }
        let frames = self.sink.finish()?;
        Ok((frames, self.sink.into_inner()))
    }
}

/// Archive reader.
///
/// Reads the entry count, then entries one at a time in either
/// [`ReadMode`]. The reader does not know when the archive is over; after
/// reading `count` entries the caller should call
/// [`assert_drained`](Self::assert_drained).
#[derive(Debug)]
pub struct ArchiveReader<R: Read> {
    source: BitSource<R>,
}

impl<R: Read> ArchiveReader<R> {
    /// Create a new archive reader with the default buffer size.
    pub fn new(reader: R) -> Self {
        Self::from_source(BitSource::new(reader))
    }

    /// Create a new archive reader for an archive written with
    /// `frame_width`-bit frames.
    pub fn with_frame_width(reader: R, frame_width: u32) -> Result<Self> {
        Ok(Self::from_source(BitSource::with_frame_width(reader, frame_width)?))
    }

    /// Create a new archive reader over an existing source.
    pub fn from_source(source: BitSource<R>) -> Self {
        Self { source }
    }

    /// Bits consumed so far.
    pub fn bit_position(&self) -> u64 {
        self.source.bit_position()
    }

    /// Read the entry count.
    pub fn read_count(&mut self) -> Result<u64> {
        varwidth::read_varwidth(&mut self.source).map_err(|e| e.in_context("entry count"))
    }

    /// Read the next entry in the given mode.
    pub fn read(&mut self, mode: ReadMode) -> Result<Entry> {
        let entry = entry::read_entry(&mut self.source, mode)?;
        log::trace!("Read {}", entry);
        Ok(entry)
    }

    /// Read the next entry including its content.
    pub fn read_entry(&mut self) -> Result<Entry> {
        self.read(ReadMode::Full)
    }

    /// Read the next entry's header and skip its content.
    pub fn scan_entry(&mut self) -> Result<Entry> {
        self.read(ReadMode::Scan)
    }

    /// Fail with [`CassetteError::NotDrained`] if anything beyond padding
    /// is left.
    pub fn assert_drained(&mut self) -> Result<()> {
        if self.source.is_drained()? {
            Ok(())
        } else {
            Err(CassetteError::not_drained(self.source.buffered_bytes()))
        }
    }

    /// Consume this reader and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }
}

/// Write `entries` as a raw archive bitstream, returning the frame count.
pub fn write_archive<W: Write>(destination: W, entries: &[PendingEntry]) -> Result<u64> {
    let mut writer = ArchiveWriter::new(destination);
    write_entries(&mut writer, entries)?;
    let (frames, _) = writer.finish()?;
    Ok(frames)
}

/// Write the count and every entry of `entries`.
pub(crate) fn write_entries<W: Write>(
    writer: &mut ArchiveWriter<W>,
    entries: &[PendingEntry],
) -> Result<()> {
    writer.write_count(entries.len() as u64)?;
    for pending in entries {
        log::info!("Writing {}", pending.name);
        writer.write_pending(pending)?;
    }
    Ok(())
}

/// Read a whole archive, handing each materialized entry to `consumer`.
///
/// Checks that the stream is drained afterwards and returns the entry
/// count.
pub fn read_archive_fully<R, F>(source: R, consumer: F) -> Result<u64>
where
    R: Read,
    F: FnMut(Entry) -> Result<()>,
{
    read_with(&mut ArchiveReader::new(source), ReadMode::Full, consumer)
}

/// Like [`read_archive_fully`] but skips over content.
pub fn scan_archive<R, F>(source: R, consumer: F) -> Result<u64>
where
    R: Read,
    F: FnMut(Entry) -> Result<()>,
{
    read_with(&mut ArchiveReader::new(source), ReadMode::Scan, consumer)
}

/// Check that `reader` has nothing but padding left.
pub fn assert_drained<R: Read>(reader: &mut ArchiveReader<R>) -> Result<()> {
    reader.assert_drained()
}

/// Read the count and that many entries, then check drainage.
pub(crate) fn read_with<R, F>(
    reader: &mut ArchiveReader<R>,
    mode: ReadMode,
    mut consumer: F,
) -> Result<u64>
where
    R: Read,
    F: FnMut(Entry) -> Result<()>,
{
    let count = reader.read_count()?;
    log::debug!("Archive holds {} entries", count);

    for _ in 0..count {
        consumer(reader.read(mode)?)?;
    }

    reader.assert_drained()?;
    Ok(count)
}

/// Read all entries of an archive in memory.
pub fn read_all(data: &[u8]) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    read_archive_fully(data, |entry| {
        entries.push(entry);
        Ok(())
    })?;
    Ok(entries)
}
