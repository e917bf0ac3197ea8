//! VarWidth unsigned integer codec.
//!
//! A value is written as a 3-bit bucket index followed by the value itself,
//! zero-extended to the bucket's width:
//!
//! ```text
//! index: 0  1  2  3  4   5   6   7
//! width: 1  2  4  8  16  32  48  64
//! ```
//!
//! The smallest bucket that holds every significant bit is always chosen,
//! so `5` encodes as `001 0101` and `0` as `000 0`.

use crate::bitstream::{BitSink, BitSource};
use crate::error::Result;
use std::io::{Read, Write};

/// Field widths selectable by the 3-bit bucket index.
pub const SIZE_TABLE: [u8; 8] = [1, 2, 4, 8, 16, 32, 48, 64];

/// Width of the bucket index prefix.
pub const PREFIX_BITS: u8 = 3;

/// Number of significant bits in `value` (0 for 0).
#[inline]
pub fn bits_used(value: u64) -> u32 {
    u64::BITS - value.leading_zeros()
}

/// Index of the smallest bucket that can hold `value`.
pub fn bucket_for(value: u64) -> usize {
    let used = bits_used(value);
    SIZE_TABLE
        .iter()
        .position(|&width| used <= u32::from(width))
        // the last bucket is 64 bits wide, so every u64 fits
        .unwrap_or(SIZE_TABLE.len() - 1)
}

/// Number of bits `value` occupies once encoded.
pub fn encoded_len(value: u64) -> u32 {
    u32::from(PREFIX_BITS) + u32::from(SIZE_TABLE[bucket_for(value)])
}

/// Write `value` to `sink`.
pub fn write_varwidth<W: Write>(sink: &mut BitSink<W>, value: u64) -> Result<()> {
    let bucket = bucket_for(value);
    sink.write_field(bucket as u64, PREFIX_BITS)?;
    sink.write_field(value, SIZE_TABLE[bucket])
}

/// Read a value from `source`.
pub fn read_varwidth<R: Read>(source: &mut BitSource<R>) -> Result<u64> {
    // a 3-bit field is always a valid index
    let bucket = source.read_field(PREFIX_BITS)? as usize;
    source.read_field(SIZE_TABLE[bucket])
}
