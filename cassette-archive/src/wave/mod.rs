//! WAVE transport container.
//!
//! A cassette travels as the sample data of an 8-bit unsigned mono PCM
//! WAVE file: canonical RIFF header, a `fmt ` chunk, and a `data` chunk whose
//! bytes are exactly the archive bitstream. Generic audio tools accept the
//! file and play it as noise; decoders strip the framing and hand the sample
//! bytes to the archive codec.
//!
//! The sample rate only exists to keep audio tools happy and is ignored when
//! reading.

mod header;

pub use header::{
    DATA_CHUNK, DEFAULT_SAMPLE_RATE, FMT_CHUNK, FORMAT_PCM, RIFF_MAGIC, UNSPECIFIED_LENGTH,
    WAVE_MAGIC, WaveFormat, WaveHeader,
};

use cassette_core::error::{CassetteError, Result};
use std::io::{self, Read, Write};

/// WAVE writer.
///
/// Sample bytes are buffered in memory because the RIFF header in front of
/// them carries their length; [`finish`](Self::finish) writes the header,
/// the samples and the RIFF pad byte in one go.
#[derive(Debug)]
pub struct WaveWriter<W: Write> {
    writer: W,
    format: WaveFormat,
    samples: Vec<u8>,
}

impl<W: Write> WaveWriter<W> {
    /// Create a new WAVE writer with the default 8-bit mono format.
    pub fn new(writer: W) -> Self {
        Self::with_format(writer, WaveFormat::default())
    }

    /// Create a new WAVE writer with an explicit format.
    pub fn with_format(writer: W, format: WaveFormat) -> Self {
        Self {
            writer,
            format,
            samples: Vec::new(),
        }
    }

    /// The format that will be declared.
    pub fn format(&self) -> &WaveFormat {
        &self.format
    }

    /// Sample bytes buffered so far.
    pub fn buffered_len(&self) -> usize {
        self.samples.len()
    }

    /// Write the file and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        let data_len = u32::try_from(self.samples.len())
            .ok()
            .filter(|&len| len <= WaveHeader::MAX_DATA_LEN)
            .ok_or_else(|| {
                CassetteError::invalid_container(format!(
                    "{} bytes of sample data do not fit in a WAVE file",
                    self.samples.len()
                ))
            })?;

        let header = WaveHeader {
            format: self.format,
            data_len: Some(data_len),
        };
        header.write(&mut self.writer)?;
        self.writer.write_all(&self.samples)?;
        if data_len % 2 == 1 {
            self.writer.write_all(&[0])?;
        }
        self.writer.flush()?;

        log::debug!("Wrote WAVE file with {} sample bytes", data_len);
        Ok(self.writer)
    }
}

impl<W: Write> Write for WaveWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.samples.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// WAVE reader.
///
/// Parses the header on construction and then reads the sample bytes of
/// the `data` chunk, stopping at its declared length. An unspecified length
/// reads to the end of the underlying reader.
#[derive(Debug)]
pub struct WaveReader<R: Read> {
    header: WaveHeader,
    data: io::Take<R>,
}

impl<R: Read> WaveReader<R> {
    /// Parse the WAVE header from `reader`.
    pub fn new(mut reader: R) -> Result<Self> {
        let header = WaveHeader::read(&mut reader)?;
        let limit = header.data_len.map_or(u64::MAX, u64::from);
        Ok(Self {
            header,
            data: reader.take(limit),
        })
    }

    /// The parsed header.
    pub fn header(&self) -> &WaveHeader {
        &self.header
    }

    /// Consume this reader and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.data.into_inner()
    }
}

impl<R: Read> Read for WaveReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}
