//! RIFF/WAVE header parsing and writing.

use cassette_core::error::{CassetteError, Result};
use std::io::{self, Read, Write};

/// RIFF magic bytes.
pub const RIFF_MAGIC: [u8; 4] = *b"RIFF";

/// WAVE form type.
pub const WAVE_MAGIC: [u8; 4] = *b"WAVE";

/// Format chunk id.
pub const FMT_CHUNK: [u8; 4] = *b"fmt ";

/// Data chunk id.
pub const DATA_CHUNK: [u8; 4] = *b"data";

/// Format tag for uncompressed PCM.
pub const FORMAT_PCM: u16 = 1;

/// Chunk length meaning "not known when the header was written".
pub const UNSPECIFIED_LENGTH: u32 = u32::MAX;

/// Sample rate written by default. Decoding never looks at it.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Length of a plain PCM format chunk body.
const FMT_LEN: u32 = 16;

/// Upper bound on format chunk bodies we are willing to buffer.
const MAX_FMT_LEN: u32 = 1024;

/// Bytes of the RIFF body taken up by everything but the sample data.
const HEADER_OVERHEAD: u32 = 4 + 8 + FMT_LEN + 8;

/// Audio format described by the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFormat {
    /// Format tag (1 = PCM).
    pub format_tag: u16,
    /// Channel count.
    pub channels: u16,
    /// Samples per second.
    pub sample_rate: u32,
    /// Bytes per second.
    pub byte_rate: u32,
    /// Bytes per sample frame across all channels.
    pub block_align: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
}

impl Default for WaveFormat {
    fn default() -> Self {
        Self::pcm8_mono(DEFAULT_SAMPLE_RATE)
    }
}

impl WaveFormat {
    /// 8-bit unsigned mono PCM at the given rate.
    pub fn pcm8_mono(sample_rate: u32) -> Self {
        Self {
            format_tag: FORMAT_PCM,
            channels: 1,
            sample_rate,
            byte_rate: sample_rate,
            block_align: 1,
            bits_per_sample: 8,
        }
    }

    /// Bits per frame of sample data.
    pub fn frame_width(&self) -> u32 {
        u32::from(self.block_align) * 8
    }

    /// Check that the format can carry a cassette.
    pub fn validate(&self) -> Result<()> {
        if self.format_tag != FORMAT_PCM {
            return Err(CassetteError::invalid_container(format!(
                "unsupported format tag {}, expected PCM",
                self.format_tag
            )));
        }
        if self.channels != 1 || self.bits_per_sample != 8 || self.block_align != 1 {
            return Err(CassetteError::invalid_container(format!(
                "expected 8-bit mono audio, found {} channel(s) of {} bits",
                self.channels, self.bits_per_sample
            )));
        }
        Ok(())
    }

    /// Write the complete `fmt ` chunk.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&FMT_CHUNK)?;
        writer.write_all(&FMT_LEN.to_le_bytes())?;
        writer.write_all(&self.format_tag.to_le_bytes())?;
        writer.write_all(&self.channels.to_le_bytes())?;
        writer.write_all(&self.sample_rate.to_le_bytes())?;
        writer.write_all(&self.byte_rate.to_le_bytes())?;
        writer.write_all(&self.block_align.to_le_bytes())?;
        writer.write_all(&self.bits_per_sample.to_le_bytes())?;
        Ok(())
    }

    /// Parse a `fmt ` chunk body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.len() < FMT_LEN as usize {
            return Err(CassetteError::invalid_container(format!(
                "format chunk is {} bytes, expected at least {}",
                body.len(),
                FMT_LEN
            )));
        }

        let u16_at = |at: usize| u16::from_le_bytes([body[at], body[at + 1]]);
        let u32_at =
            |at: usize| u32::from_le_bytes([body[at], body[at + 1], body[at + 2], body[at + 3]]);

        Ok(Self {
            format_tag: u16_at(0),
            channels: u16_at(2),
            sample_rate: u32_at(4),
            byte_rate: u32_at(8),
            block_align: u16_at(12),
            bits_per_sample: u16_at(14),
        })
    }
}

/// The parts of a WAVE header that matter for decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveHeader {
    /// Audio format.
    pub format: WaveFormat,
    /// Declared data chunk length, `None` if unspecified.
    pub data_len: Option<u32>,
}

impl WaveHeader {
    /// Largest data chunk a RIFF size field can describe.
    pub const MAX_DATA_LEN: u32 = u32::MAX - HEADER_OVERHEAD - 1;

    /// Write everything up to the first sample byte.
    ///
    /// A `data_len` of `None` marks both the RIFF and data sizes as
    /// unspecified, for writers that cannot know the length up front.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let riff_len = match self.data_len {
            Some(len) if len > Self::MAX_DATA_LEN => {
                return Err(CassetteError::invalid_container(format!(
                    "{len} bytes of sample data do not fit in a WAVE file"
                )));
            }
            Some(len) => HEADER_OVERHEAD + len + (len & 1),
            None => UNSPECIFIED_LENGTH,
        };

        writer.write_all(&RIFF_MAGIC)?;
        writer.write_all(&riff_len.to_le_bytes())?;
        writer.write_all(&WAVE_MAGIC)?;
        self.format.write(writer)?;
        writer.write_all(&DATA_CHUNK)?;
        writer
            .write_all(&self.data_len.unwrap_or(UNSPECIFIED_LENGTH).to_le_bytes())?;
        Ok(())
    }

    /// Read the header, leaving `reader` at the first sample byte.
    ///
    /// Chunks other than `fmt ` and `data` are skipped. The format chunk
    /// must precede the data chunk.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut riff = [0u8; 12];
        read_exact(reader, &mut riff, "RIFF header")?;

        if riff[0..4] != RIFF_MAGIC || riff[8..12] != WAVE_MAGIC {
            return Err(CassetteError::invalid_container("not a RIFF/WAVE file"));
        }

        let mut format = None;
        loop {
            let mut chunk = [0u8; 8];
            read_exact(reader, &mut chunk, "chunk header")?;
            let id = [chunk[0], chunk[1], chunk[2], chunk[3]];
            let len = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);

            match id {
                FMT_CHUNK => {
                    if len > MAX_FMT_LEN {
                        return Err(CassetteError::invalid_container(format!(
                            "format chunk of {len} bytes"
                        )));
                    }
                    let mut body = vec![0u8; len as usize + (len as usize & 1)];
                    read_exact(reader, &mut body, "format chunk")?;
                    let parsed = WaveFormat::parse(&body[..len as usize])?;
                    parsed.validate()?;
                    format = Some(parsed);
                }
                DATA_CHUNK => {
                    let format = format.ok_or_else(|| {
                        CassetteError::invalid_container("data chunk before format chunk")
                    })?;
                    let data_len = (len != UNSPECIFIED_LENGTH).then_some(len);
                    log::debug!("WAVE data chunk: {:?} bytes, {:?}", data_len, format);
                    return Ok(Self { format, data_len });
                }
                other => {
                    log::trace!(
                        "Skipping {:?} chunk of {} bytes",
                        String::from_utf8_lossy(&other),
                        len
                    );
                    let padded = u64::from(len) + u64::from(len & 1);
                    let skipped = io::copy(&mut reader.by_ref().take(padded), &mut io::sink())?;
                    if skipped < padded {
                        return Err(CassetteError::invalid_container("truncated chunk"));
                    }
                }
            }
        }
    }
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CassetteError::invalid_container(format!("truncated {what}"))
        } else {
            e.into()
        }
    })
}
