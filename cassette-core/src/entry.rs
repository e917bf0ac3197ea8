//! Archive entries and the entry codec.
//!
//! On the wire an entry is its name as a packed string (with a trailing
//! [`NAK`] when the entry is negative), its size as a VarWidth integer, zero
//! padding up to the next byte boundary and finally the raw content.
//!
//! # Negative names
//!
//! The negative flag shares its signal with a literal trailing `NAK` in the
//! name. A non-negative entry whose name really ends in `NAK` therefore
//! decodes as a negative entry with that character stripped. This is a
//! limitation of the format; the writer logs a warning when it happens.

use crate::bitstream::{BitSink, BitSource};
use crate::error::{CassetteError, Result};
use crate::packed::{self, NAK};
use crate::varwidth;
use std::fmt;
use std::io::{Read, Write};

/// Chunk size used while materializing entry content.
const READ_CHUNK: usize = 64 * 1024;

/// How much of an entry to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Decode the header and read the content into memory.
    #[default]
    Full,
    /// Decode the header and skip over the content.
    Scan,
}

/// An entry in a cassette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Forward-slash separated relative path.
    pub name: String,
    /// Whether consumers should leave this entry out by default.
    pub negative: bool,
    /// Content size in bytes.
    pub size: u64,
    /// Content, present only when read in [`ReadMode::Full`].
    pub content: Option<Vec<u8>>,
}

impl Entry {
    /// Create a materialized entry.
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            negative: false,
            size: content.len() as u64,
            content: Some(content),
        }
    }

    /// Create a materialized negative entry.
    pub fn new_negative(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            negative: true,
            ..Self::new(name, content)
        }
    }

    /// Create a header-only entry, as produced by a scan.
    pub fn header(name: impl Into<String>, negative: bool, size: u64) -> Self {
        Self {
            name: name.into(),
            negative,
            size,
            content: None,
        }
    }

    /// Whether the content was read.
    pub fn is_materialized(&self) -> bool {
        self.content.is_some()
    }

    /// Borrow the content, if it was read.
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// Take the content, if it was read.
    pub fn into_content(self) -> Option<Vec<u8>> {
        self.content
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "[{}], {} bytes", self.name, self.size)
        } else {
            write!(f, "{}, {} bytes", self.name, self.size)
        }
    }
}

/// Name as it goes on the wire.
fn wire_name(name: &str, negative: bool) -> String {
    if negative {
        let mut raw = String::with_capacity(name.len() + 1);
        raw.push_str(name);
        raw.push(char::from(NAK));
        raw
    } else {
        if name.as_bytes().last() == Some(&NAK) {
            log::warn!(
                "Entry name {:?} ends in NAK and will read back as negative",
                name
            );
        }
        name.to_owned()
    }
}

/// Write everything up to the content, leaving the sink byte-aligned.
pub fn write_header<W: Write>(
    sink: &mut BitSink<W>,
    name: &str,
    negative: bool,
    size: u64,
) -> Result<()> {
    debug_assert!(!name.contains('\\'), "entry names use forward slashes");
    packed::write_string(sink, &wire_name(name, negative))?;
    varwidth::write_varwidth(sink, size)?;
    sink.drain_to_byte()
}

/// Write an entry whose content is in memory.
pub fn write_entry<W: Write>(
    sink: &mut BitSink<W>,
    name: &str,
    negative: bool,
    content: &[u8],
) -> Result<()> {
    write_header(sink, name, negative, content.len() as u64)?;
    sink.write_blob(content)
}

/// Write an entry whose `size` bytes of content come from `source`.
pub fn write_entry_from<W: Write, R: Read>(
    sink: &mut BitSink<W>,
    name: &str,
    negative: bool,
    size: u64,
    source: R,
) -> Result<()> {
    write_header(sink, name, negative, size)?;
    sink.copy_blob(source, size)
        .map_err(|e| e.in_context("entry source"))
}

/// Read one entry.
pub fn read_entry<R: Read>(source: &mut BitSource<R>, mode: ReadMode) -> Result<Entry> {
    let mut name = packed::read_string(source).map_err(|e| e.in_context("entry name"))?;

    let negative = name.as_bytes().last() == Some(&NAK);
    if negative {
        name.pop();
    }

    let size = varwidth::read_varwidth(source).map_err(|e| e.in_context("entry size"))?;
    source.skip_to_byte_boundary();

    let content = match mode {
        ReadMode::Full => Some(read_content(source, size)?),
        ReadMode::Scan => {
            source
                .skip_bytes(size)
                .map_err(|e| e.in_context("entry content"))?;
            None
        }
    };

    Ok(Entry {
        name,
        negative,
        size,
        content,
    })
}

/// Read `size` content bytes, growing the buffer as data actually arrives.
fn read_content<R: Read>(source: &mut BitSource<R>, size: u64) -> Result<Vec<u8>> {
    let total = usize::try_from(size).map_err(|_| CassetteError::EntryTooLarge { size })?;
    let mut content = Vec::with_capacity(total.min(READ_CHUNK));

    while content.len() < total {
        let start = content.len();
        let step = (total - start).min(READ_CHUNK);
        content.resize(start + step, 0);
        source
            .read_blob(&mut content[start..])
            .map_err(|e| e.in_context("entry content"))?;
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(entries: &[Entry]) -> Vec<u8> {
        let mut output = Vec::new();
        let mut sink = BitSink::new(&mut output);
        for entry in entries {
            write_entry(
                &mut sink,
                &entry.name,
                entry.negative,
                entry.content().unwrap(),
            )
            .unwrap();
        }
        sink.finish().unwrap();
        output
    }

    fn sample() -> Vec<Entry> {
        vec![
            Entry::new("a.txt", vec![0x48, 0x69]),
            Entry::new_negative("b/c.bin", vec![0xFF]),
        ]
    }

    #[test]
    fn test_full_roundtrip() {
        let entries = sample();
        let mut source = BitSource::new(Cursor::new(encode(&entries)));
        for expected in &entries {
            let entry = read_entry(&mut source, ReadMode::Full).unwrap();
            assert_eq!(&entry, expected);
            assert_eq!(entry.size, entry.content().unwrap().len() as u64);
        }
        assert!(source.is_drained().unwrap());
    }

    #[test]
    fn test_scan_roundtrip() {
        let entries = sample();
        let mut source = BitSource::with_capacity(Cursor::new(encode(&entries)), 1);
        for expected in &entries {
            let entry = read_entry(&mut source, ReadMode::Scan).unwrap();
            assert_eq!(entry.name, expected.name);
            assert_eq!(entry.negative, expected.negative);
            assert_eq!(entry.size, expected.size);
            assert!(!entry.is_materialized());
        }
        assert!(source.is_drained().unwrap());
    }

    #[test]
    fn test_mixed_modes() {
        let entries = vec![
            Entry::new("skip.me", vec![1; 300]),
            Entry::new("keep.me", vec![2; 5]),
        ];
        let mut source = BitSource::with_capacity(Cursor::new(encode(&entries)), 7);
        let first = read_entry(&mut source, ReadMode::Scan).unwrap();
        assert_eq!(first.size, 300);
        let second = read_entry(&mut source, ReadMode::Full).unwrap();
        assert_eq!(second.content(), Some(&[2u8; 5][..]));
    }

    #[test]
    fn test_content_starts_on_byte_boundary() {
        // "a.txt" + ETX = 42 bits, size 2 = 3 + 2 bits: 47 bits, one padding bit.
        let output = encode(&[Entry::new("a.txt", vec![0x48, 0x69])]);
        assert_eq!(output.len(), 6 + 2);
        assert_eq!(&output[6..], &[0x48, 0x69]);
    }

    #[test]
    fn test_empty_content() {
        let entries = vec![Entry::new("empty", Vec::new()), Entry::new("", vec![9])];
        let mut source = BitSource::new(Cursor::new(encode(&entries)));
        assert_eq!(read_entry(&mut source, ReadMode::Full).unwrap(), entries[0]);
        assert_eq!(read_entry(&mut source, ReadMode::Full).unwrap(), entries[1]);
        assert!(source.is_drained().unwrap());
    }

    #[test]
    fn test_nak_suffix_reads_back_negative() {
        let literal = format!("odd{}", char::from(NAK));
        let output = encode(&[Entry::new(literal.clone(), vec![1])]);
        let mut source = BitSource::new(Cursor::new(output));
        let entry = read_entry(&mut source, ReadMode::Full).unwrap();
        assert!(entry.negative);
        assert_eq!(entry.name, "odd");
        assert_ne!(entry.name, literal);
    }

    #[test]
    fn test_write_entry_from_reader() {
        let mut output = Vec::new();
        let mut sink = BitSink::new(&mut output);
        write_entry_from(&mut sink, "r.bin", false, 3, &b"xyz"[..]).unwrap();
        sink.finish().unwrap();

        let mut source = BitSource::new(Cursor::new(output));
        let entry = read_entry(&mut source, ReadMode::Full).unwrap();
        assert_eq!(entry.content(), Some(&b"xyz"[..]));
    }

    #[test]
    fn test_write_entry_from_short_reader() {
        let mut sink = BitSink::new(Vec::new());
        let err = write_entry_from(&mut sink, "r.bin", false, 10, &b"xyz"[..]).unwrap_err();
        match err {
            CassetteError::UnexpectedEof { context, .. } => assert_eq!(context, "entry source"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncated_content() {
        let mut output = encode(&[Entry::new("t", vec![7; 100])]);
        output.truncate(output.len() - 1);

        for mode in [ReadMode::Full, ReadMode::Scan] {
            let mut source = BitSource::new(Cursor::new(output.clone()));
            match read_entry(&mut source, mode).unwrap_err() {
                CassetteError::UnexpectedEof { context, .. } => {
                    assert_eq!(context, "entry content")
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Entry::new("a", vec![1, 2]).to_string(), "a, 2 bytes");
        assert_eq!(Entry::header("b", true, 9).to_string(), "[b], 9 bytes");
    }
}
