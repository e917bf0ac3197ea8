//! Cassette files: an archive carried inside a WAVE container.

use crate::archive::{self, ArchiveReader, ArchiveWriter, PendingEntry};
use crate::wave::{WaveFormat, WaveReader, WaveWriter};
use cassette_core::bitstream::{BitSink, BitSource};
use cassette_core::entry::{Entry, ReadMode};
use cassette_core::error::Result;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Write `entries` as a WAVE cassette at `path`, returning the frame count.
///
/// The cassette is encoded in memory first; `path` is only created or
/// replaced once every entry has been encoded.
pub fn write_cassette(path: impl AsRef<Path>, entries: &[PendingEntry]) -> Result<u64> {
    let path = path.as_ref();
    let mut data = Vec::new();
    let frames = write_cassette_to(&mut data, entries, WaveFormat::default())?;
    fs::write(path, &data)?;
    log::debug!("Wrote {} frames to {}", frames, path.display());
    Ok(frames)
}

/// Write `entries` as a WAVE cassette to `destination`.
pub fn write_cassette_to<W: Write>(
    destination: W,
    entries: &[PendingEntry],
    format: WaveFormat,
) -> Result<u64> {
    format.validate()?;
    let wave = WaveWriter::with_format(destination, format);
    let sink = BitSink::with_frame_width(wave, format.frame_width())?;

    let mut writer = ArchiveWriter::from_sink(sink);
    archive::write_entries(&mut writer, entries)?;
    let (frames, wave) = writer.finish()?;
    wave.finish()?;
    Ok(frames)
}

/// Read the cassette at `path`, handing each materialized entry to
/// `consumer`. Returns the entry count.
pub fn read_cassette<F>(path: impl AsRef<Path>, consumer: F) -> Result<u64>
where
    F: FnMut(Entry) -> Result<()>,
{
    read_cassette_from(BufReader::new(File::open(path)?), consumer)
}

/// Like [`read_cassette`] but skips over content.
pub fn scan_cassette<F>(path: impl AsRef<Path>, consumer: F) -> Result<u64>
where
    F: FnMut(Entry) -> Result<()>,
{
    scan_cassette_from(BufReader::new(File::open(path)?), consumer)
}

/// Read a cassette from any reader.
pub fn read_cassette_from<R, F>(source: R, consumer: F) -> Result<u64>
where
    R: Read,
    F: FnMut(Entry) -> Result<()>,
{
    read_wave(source, ReadMode::Full, consumer)
}

/// Scan a cassette from any reader.
pub fn scan_cassette_from<R, F>(source: R, consumer: F) -> Result<u64>
where
    R: Read,
    F: FnMut(Entry) -> Result<()>,
{
    read_wave(source, ReadMode::Scan, consumer)
}

fn read_wave<R, F>(source: R, mode: ReadMode, consumer: F) -> Result<u64>
where
    R: Read,
    F: FnMut(Entry) -> Result<()>,
{
    let wave = WaveReader::new(source)?;
    let frame_width = wave.header().format.frame_width();
    let mut reader = ArchiveReader::from_source(BitSource::with_frame_width(wave, frame_width)?);
    archive::read_with(&mut reader, mode, consumer)
}
