//! Bit-level I/O for the cassette codec.
//!
//! This module provides [`BitSink`] and [`BitSource`], the only stateful
//! pieces of the codec. Everything above them (integers, strings, entries)
//! is a pure function of the cursor they maintain.
//!
//! # Bit Ordering
//!
//! Cassettes use MSB-first ordering: the first bit written lands in the most
//! significant bit of a byte, and multi-bit fields are emitted starting with
//! their most significant bit. This differs from DEFLATE/LZH, which pack
//! LSB-first.
//!
//! # Example
//!
//! ```
//! use cassette_core::bitstream::{BitSink, BitSource};
//! use std::io::Cursor;
//!
//! let mut output = Vec::new();
//! let mut sink = BitSink::new(&mut output);
//! sink.write_field(0b101, 3).unwrap();
//! sink.write_field(0b1100, 4).unwrap();
//! let frames = sink.finish().unwrap();
//! assert_eq!(frames, 1);
//! assert_eq!(output, vec![0b1011_1000]);
//!
//! let mut source = BitSource::new(Cursor::new(output));
//! assert_eq!(source.read_field(3).unwrap(), 0b101);
//! assert_eq!(source.read_field(4).unwrap(), 0b1100);
//! assert!(source.is_drained().unwrap());
//! ```

use crate::error::{CassetteError, Result};
use std::io::{self, Read, Write};

/// Width of one frame of the 8-bit PCM container, in bits.
pub const DEFAULT_FRAME_WIDTH: u32 = 8;

/// Default capacity of the [`BitSource`] read buffer, in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Queue head value meaning no bits are pending.
const QUEUE_EMPTY: u8 = 7;

/// Frames must be a non-zero multiple of 8 bits, at most 64.
fn check_frame_width(frame_width: u32) -> Result<()> {
    if frame_width == 0 || frame_width % 8 != 0 || frame_width > 64 {
        return Err(CassetteError::InvalidFrameWidth { width: frame_width });
    }
    Ok(())
}

/// A bit-level writer that wraps any `Write` implementation.
///
/// Bits are queued MSB-first into a single byte which is emitted as soon as
/// it is complete. Alongside the byte queue the sink keeps frame accounting:
/// after every write the running bit count is folded into whole frames plus
/// a remainder smaller than one frame, so [`finish`](Self::finish) knows how
/// much padding completes the final frame.
#[derive(Debug)]
pub struct BitSink<W: Write> {
    /// Underlying writer.
    writer: W,
    /// Bits per frame.
    frame_width: u32,
    /// Complete frames written so far.
    frames_written: u64,
    /// Bits written beyond the last complete frame.
    bits_written: u64,
    /// Partially filled output byte.
    queue: u8,
    /// Bit index (7 = MSB) the next queued bit goes to.
    queue_head: u8,
}

impl<W: Write> BitSink<W> {
    /// Create a new `BitSink` with one-byte frames.
    pub fn new(writer: W) -> Self {
        Self::build(writer, DEFAULT_FRAME_WIDTH)
    }

    /// Create a new `BitSink` with a custom frame width.
    ///
    /// The width must be a non-zero multiple of 8 no larger than 64, so that
    /// padding to a frame boundary always leaves the output byte-aligned.
    pub fn with_frame_width(writer: W, frame_width: u32) -> Result<Self> {
        check_frame_width(frame_width)?;
        Ok(Self::build(writer, frame_width))
    }

    fn build(writer: W, frame_width: u32) -> Self {
        Self {
            writer,
            frame_width,
            frames_written: 0,
            bits_written: 0,
            queue: 0,
            queue_head: QUEUE_EMPTY,
        }
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Get a mutable reference to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Consume this `BitSink` and return the underlying writer.
    ///
    /// Pending bits are discarded; call [`finish`](Self::finish) first.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Bits per frame.
    pub fn frame_width(&self) -> u32 {
        self.frame_width
    }

    /// Complete frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Bits written past the last complete frame.
    pub fn pending_bits(&self) -> u64 {
        self.bits_written
    }

    /// Total bits written, for error reporting.
    pub fn bit_position(&self) -> u64 {
        self.frames_written
            .saturating_mul(u64::from(self.frame_width))
            .saturating_add(self.bits_written)
    }

    /// Whether no partial byte is queued.
    #[inline]
    pub fn is_byte_aligned(&self) -> bool {
        self.queue_head == QUEUE_EMPTY
    }

    #[inline]
    fn push_bit(&mut self, bit: bool) -> Result<()> {
        self.queue |= u8::from(bit) << self.queue_head;
        self.add_bits(1)?;

        if self.queue_head == 0 {
            self.writer.write_all(&[self.queue])?;
            self.queue = 0;
            self.queue_head = QUEUE_EMPTY;
        } else {
            self.queue_head -= 1;
        }
        Ok(())
    }

    #[inline]
    fn add_bits(&mut self, bits: u64) -> Result<()> {
        self.bits_written = self
            .bits_written
            .checked_add(bits)
            .ok_or(CassetteError::CounterOverflow)?;
        Ok(())
    }

    fn add_bytes(&mut self, bytes: u64) -> Result<()> {
        let bits = bytes
            .checked_mul(8)
            .ok_or(CassetteError::CounterOverflow)?;
        self.add_bits(bits)
    }

    /// Fold the running bit count into whole frames.
    fn fold_frames(&mut self) -> Result<()> {
        let width = u64::from(self.frame_width);
        self.frames_written = self
            .frames_written
            .checked_add(self.bits_written / width)
            .ok_or(CassetteError::CounterOverflow)?;
        self.bits_written %= width;
        debug_assert!(self.bits_written < width);
        Ok(())
    }

    /// Write a single bit.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.push_bit(bit)?;
        self.fold_frames()
    }

    /// Write the low `width` bits of `value`, most significant first.
    ///
    /// Bits are queued one at a time only until the output is byte-aligned;
    /// whole bytes of the field then go straight to the writer.
    ///
    /// # Panics
    ///
    /// Panics if `width` is greater than 64.
    pub fn write_field(&mut self, value: u64, width: u8) -> Result<()> {
        assert!(width <= 64, "cannot write a {width}-bit field");
        let mut remaining = u32::from(width);

        while remaining > 0 && !self.is_byte_aligned() {
            remaining -= 1;
            self.push_bit((value >> remaining) & 1 == 1)?;
        }

        if remaining >= 8 {
            let mut bytes = [0u8; 8];
            let mut len = 0;
            while remaining >= 8 {
                remaining -= 8;
                bytes[len] = (value >> remaining) as u8;
                len += 1;
            }
            self.writer.write_all(&bytes[..len])?;
            self.add_bytes(len as u64)?;
        }

        while remaining > 0 {
            remaining -= 1;
            self.push_bit((value >> remaining) & 1 == 1)?;
        }

        self.fold_frames()
    }

    /// Pad with zero bits up to the next byte boundary.
    pub fn drain_to_byte(&mut self) -> Result<()> {
        while !self.is_byte_aligned() {
            self.push_bit(false)?;
        }
        self.fold_frames()
    }

    /// Write raw bytes.
    ///
    /// # Panics
    ///
    /// Panics if the sink is not byte-aligned.
    pub fn write_blob(&mut self, bytes: &[u8]) -> Result<()> {
        assert!(self.is_byte_aligned(), "blob written mid-byte");
        self.writer.write_all(bytes)?;
        self.add_bytes(bytes.len() as u64)?;
        self.fold_frames()
    }

    /// Copy exactly `size` raw bytes from `source`.
    ///
    /// Fails with [`CassetteError::UnexpectedEof`] if the source runs dry
    /// first; the bytes that were copied stay written.
    ///
    /// # Panics
    ///
    /// Panics if the sink is not byte-aligned.
    pub fn copy_blob<R: Read>(&mut self, source: R, size: u64) -> Result<()> {
        assert!(self.is_byte_aligned(), "blob written mid-byte");
        let copied = io::copy(&mut source.take(size), &mut self.writer)?;
        self.add_bytes(copied)?;
        self.fold_frames()?;

        if copied < size {
            return Err(CassetteError::unexpected_eof(
                self.bit_position(),
                "blob source",
            ));
        }
        Ok(())
    }

    /// Complete the final frame and flush.
    ///
    /// Pads with zero bits until the output is a whole number of frames,
    /// flushes the underlying writer and returns the total frame count.
    pub fn finish(&mut self) -> Result<u64> {
        self.fold_frames()?;

        if self.bits_written != 0 {
            let padding = u64::from(self.frame_width) - self.bits_written;
            // frame_width <= 64 keeps this in range
            self.write_field(0, padding as u8)?;
        }

        debug_assert_eq!(self.bits_written, 0);
        debug_assert!(self.is_byte_aligned());
        self.writer.flush()?;
        Ok(self.frames_written)
    }
}

/// Outcome of pulling another chunk from the underlying reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refill {
    /// This many bytes are now buffered.
    Filled(usize),
    /// The underlying reader has no more data.
    EndOfStream,
}

/// A buffered bit-level reader that wraps any `Read` implementation.
///
/// The source keeps a fixed-capacity byte buffer and a `[head, tail)` window
/// of bit addresses into it. `tail` is always a whole number of bytes, so
/// whenever `head` is byte-aligned the rest of the window can be copied or
/// skipped a byte at a time.
///
/// The frame width only matters to [`is_drained`](Self::is_drained): it must
/// match the width the stream was written with so that zero bytes padding
/// the final frame are not mistaken for trailing data.
#[derive(Debug)]
pub struct BitSource<R: Read> {
    /// Underlying reader.
    reader: R,
    /// Chunk buffer.
    buffer: Box<[u8]>,
    /// Next bit to read.
    head: usize,
    /// One past the last valid bit.
    tail: usize,
    /// Bytes consumed by earlier chunks.
    consumed: u64,
    /// Bits per frame of the stream being read.
    frame_width: u32,
}

impl<R: Read> BitSource<R> {
    /// Create a new `BitSource` with the default buffer capacity.
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a new `BitSource` with a buffer of `capacity` bytes.
    ///
    /// A capacity of zero is rounded up to one byte.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader,
            buffer: vec![0u8; capacity.max(1)].into_boxed_slice(),
            head: 0,
            tail: 0,
            consumed: 0,
            frame_width: DEFAULT_FRAME_WIDTH,
        }
    }

    /// Create a new `BitSource` for a stream written with `frame_width`-bit
    /// frames.
    pub fn with_frame_width(reader: R, frame_width: u32) -> Result<Self> {
        check_frame_width(frame_width)?;
        Ok(Self {
            frame_width,
            ..Self::new(reader)
        })
    }

    /// Bits per frame.
    pub fn frame_width(&self) -> u32 {
        self.frame_width
    }

    /// Get a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Get a mutable reference to the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Consume this `BitSource` and return the underlying reader.
    ///
    /// Any buffered data is lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Total bits consumed so far.
    pub fn bit_position(&self) -> u64 {
        self.consumed
            .saturating_mul(8)
            .saturating_add(self.head as u64)
    }

    /// Whether the cursor sits on a byte boundary.
    #[inline]
    pub fn is_byte_aligned(&self) -> bool {
        self.head % 8 == 0
    }

    /// Whole bytes left in the buffer after the cursor.
    pub fn buffered_bytes(&self) -> usize {
        (self.tail - self.head) / 8
    }

    /// Pull the next chunk from the underlying reader.
    ///
    /// Only does any reading once the buffer is exhausted; before that it
    /// reports what is still buffered.
    pub fn refill(&mut self) -> Result<Refill> {
        if self.head < self.tail {
            return Ok(Refill::Filled((self.tail - self.head).div_ceil(8)));
        }

        self.consumed = self
            .consumed
            .checked_add((self.tail / 8) as u64)
            .ok_or(CassetteError::CounterOverflow)?;
        self.head = 0;
        self.tail = 0;

        loop {
            match self.reader.read(&mut self.buffer) {
                Ok(0) => return Ok(Refill::EndOfStream),
                Ok(n) => {
                    self.tail = n.checked_mul(8).ok_or(CassetteError::CounterOverflow)?;
                    return Ok(Refill::Filled(n));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Make sure at least one bit is buffered.
    #[inline]
    fn ensure_available(&mut self, context: &'static str) -> Result<()> {
        if self.head == self.tail && self.refill()? == Refill::EndOfStream {
            return Err(CassetteError::unexpected_eof(self.bit_position(), context));
        }
        Ok(())
    }

    #[inline]
    fn take_bit(&mut self) -> Result<u64> {
        self.ensure_available("bit field")?;
        let byte = self.buffer[self.head / 8];
        let bit = (byte >> (7 - self.head % 8)) & 1;
        self.head += 1;
        Ok(u64::from(bit))
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.take_bit()? == 1)
    }

    /// Read a `width`-bit field, most significant bit first.
    ///
    /// # Panics
    ///
    /// Panics if `width` is greater than 64.
    pub fn read_field(&mut self, width: u8) -> Result<u64> {
        assert!(width <= 64, "cannot read a {width}-bit field");
        let mut remaining = width;
        let mut value = 0u64;

        while remaining > 0 && !self.is_byte_aligned() {
            value = (value << 1) | self.take_bit()?;
            remaining -= 1;
        }

        while remaining >= 8 {
            self.ensure_available("bit field")?;
            value = (value << 8) | u64::from(self.buffer[self.head / 8]);
            self.head += 8;
            remaining -= 8;
        }

        while remaining > 0 {
            value = (value << 1) | self.take_bit()?;
            remaining -= 1;
        }

        Ok(value)
    }

    /// Discard the rest of the current partial byte.
    pub fn skip_to_byte_boundary(&mut self) {
        let offset = self.head % 8;
        if offset != 0 {
            self.head += 8 - offset;
        }
        debug_assert!(self.head <= self.tail);
    }

    /// Fill `buf` with raw bytes.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is not byte-aligned.
    pub fn read_blob(&mut self, buf: &mut [u8]) -> Result<()> {
        assert!(self.is_byte_aligned(), "blob read mid-byte");
        let mut filled = 0;

        while filled < buf.len() {
            self.ensure_available("raw bytes")?;
            let start = self.head / 8;
            let count = self.buffered_bytes().min(buf.len() - filled);
            buf[filled..filled + count].copy_from_slice(&self.buffer[start..start + count]);
            self.head += count * 8;
            filled += count;
        }

        Ok(())
    }

    /// Discard `count` raw bytes.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is not byte-aligned.
    pub fn skip_bytes(&mut self, count: u64) -> Result<()> {
        assert!(self.is_byte_aligned(), "bytes skipped mid-byte");
        let mut remaining = count;

        while remaining > 0 {
            self.ensure_available("raw bytes")?;
            let step = (self.buffered_bytes() as u64).min(remaining);
            // step <= buffered_bytes, which is a usize
            self.head += step as usize * 8;
            remaining -= step;
        }

        Ok(())
    }

    /// Check that nothing but padding is left.
    ///
    /// The rest of the current byte is discarded first, then any zero bytes
    /// completing the current frame. Returns `false` if any further byte is
    /// available; that byte stays buffered.
    pub fn is_drained(&mut self) -> Result<bool> {
        self.skip_to_byte_boundary();

        let frame_bytes = u64::from(self.frame_width / 8);
        let mut padding = (frame_bytes - (self.bit_position() / 8) % frame_bytes) % frame_bytes;
        while padding > 0 {
            if self.head == self.tail && self.refill()? == Refill::EndOfStream {
                return Ok(true);
            }
            if self.buffer[self.head / 8] != 0 {
                return Ok(false);
            }
            self.head += 8;
            padding -= 1;
        }

        if self.head < self.tail {
            return Ok(false);
        }
        Ok(self.refill()? == Refill::EndOfStream)
    }
}
