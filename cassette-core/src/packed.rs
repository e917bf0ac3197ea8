//! Packed 7-bit string codec.
//!
//! Strings are restricted to 7-bit ASCII and stored as one 7-bit field per
//! character followed by [`ETX`]. The writer groups nine characters into a
//! single 63-bit field and emits the leftover characters as one shorter
//! field; because fields are written MSB-first the bitstream is identical to
//! writing each character separately, so the reader simply takes seven bits
//! at a time until it meets the terminator.

use crate::bitstream::{BitSink, BitSource};
use crate::error::{CassetteError, Result};
use std::io::{Read, Write};

/// End of text: terminates every packed string.
pub const ETX: u8 = 0x03;

/// Negative acknowledgement: trailing marker of a negative entry name.
pub const NAK: u8 = 0x15;

/// Bits per packed character.
pub const CHAR_BITS: u8 = 7;

/// Characters per batched field (9 * 7 = 63 bits).
const BATCH: usize = 9;

/// Check that `value` can be packed.
pub fn validate(value: &str) -> Result<()> {
    if !value.is_ascii() {
        return Err(CassetteError::non_ascii_name(value));
    }
    if value.as_bytes().contains(&ETX) {
        return Err(CassetteError::malformed_name(value));
    }
    Ok(())
}

/// Pack up to nine characters into one field, first character highest.
fn pack(chars: &[u8]) -> u64 {
    chars
        .iter()
        .fold(0u64, |bits, &c| (bits << CHAR_BITS) | u64::from(c & 0x7F))
}

/// Write `value` followed by [`ETX`].
pub fn write_string<W: Write>(sink: &mut BitSink<W>, value: &str) -> Result<()> {
    validate(value)?;

    let mut contents = Vec::with_capacity(value.len() + 1);
    contents.extend_from_slice(value.as_bytes());
    contents.push(ETX);

    for batch in contents.chunks(BATCH) {
        // at most 9 * 7 = 63 bits
        let width = (batch.len() * usize::from(CHAR_BITS)) as u8;
        sink.write_field(pack(batch), width)?;
    }
    Ok(())
}

/// Read characters up to (and excluding) the next [`ETX`].
pub fn read_string<R: Read>(source: &mut BitSource<R>) -> Result<String> {
    let mut contents = Vec::new();

    loop {
        let c = source
            .read_field(CHAR_BITS)
            .map_err(|e| e.in_context("packed string"))? as u8;
        if c == ETX {
            break;
        }
        contents.push(c);
    }

    // every byte is below 0x80
    Ok(contents.into_iter().map(char::from).collect())
}
