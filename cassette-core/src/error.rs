//! Error types for Cassette operations.
//!
//! One error type covers every failure of the codec stack: I/O from the
//! underlying byte sink or source, names the string codec cannot represent,
//! truncated streams, trailing data after an archive and malformed WAVE
//! framing.

use std::io;
use thiserror::Error;

/// The main error type for Cassette operations.
#[derive(Debug, Error)]
pub enum CassetteError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Entry name contains the string terminator.
    #[error("Name {name:?} contains the end-of-text marker")]
    MalformedName {
        /// The offending name.
        name: String,
    },

    /// Entry name contains a character outside 7-bit ASCII.
    #[error("Name {name:?} is not 7-bit ASCII")]
    NonAsciiName {
        /// The offending name.
        name: String,
    },

    /// The stream ran out of data mid-field, mid-string or mid-content.
    #[error("Unexpected end of stream at bit {bit_position} while reading {context}")]
    UnexpectedEof {
        /// Bit position at which the data ran out.
        bit_position: u64,
        /// What was being read.
        context: &'static str,
    },

    /// Data remained after the last entry of an archive.
    #[error("Expected stream to be finished yet there were at least {remaining} bytes left")]
    NotDrained {
        /// Number of bytes known to remain.
        remaining: usize,
    },

    /// A bit or frame counter overflowed.
    #[error("Bit counter overflow")]
    CounterOverflow,

    /// Frame width is not a usable number of bits.
    #[error("Invalid frame width: {width} bits (must be a non-zero multiple of 8, at most 64)")]
    InvalidFrameWidth {
        /// The rejected width.
        width: u32,
    },

    /// Entry is too large to be held in memory.
    #[error("Entry of {size} bytes is too large to read into memory")]
    EntryTooLarge {
        /// Declared entry size.
        size: u64,
    },

    /// The WAVE container around the archive is malformed.
    #[error("Invalid container: {message}")]
    InvalidContainer {
        /// Description of the container error.
        message: String,
    },

    /// A glob filter pattern could not be compiled.
    #[error("Invalid filter {pattern:?}: {message}")]
    InvalidFilter {
        /// The pattern as given.
        pattern: String,
        /// Why it was rejected.
        message: String,
    },

    /// Entry name would escape the extraction directory.
    #[error("Unsafe path in entry: {name}")]
    UnsafePath {
        /// The suspicious name.
        name: String,
    },
}

/// Result type alias for Cassette operations.
pub type Result<T> = std::result::Result<T, CassetteError>;

impl CassetteError {
    /// Create a malformed name error.
    pub fn malformed_name(name: impl Into<String>) -> Self {
        Self::MalformedName { name: name.into() }
    }

    /// Create a non-ASCII name error.
    pub fn non_ascii_name(name: impl Into<String>) -> Self {
        Self::NonAsciiName { name: name.into() }
    }

    /// Create an unexpected end of stream error.
    pub fn unexpected_eof(bit_position: u64, context: &'static str) -> Self {
        Self::UnexpectedEof {
            bit_position,
            context,
        }
    }

    /// Create a not drained error.
    pub fn not_drained(remaining: usize) -> Self {
        Self::NotDrained { remaining }
    }

    /// Create an invalid container error.
    pub fn invalid_container(message: impl Into<String>) -> Self {
        Self::InvalidContainer {
            message: message.into(),
        }
    }

    /// Create an invalid filter error.
    pub fn invalid_filter(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFilter {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create an unsafe path error.
    pub fn unsafe_path(name: impl Into<String>) -> Self {
        Self::UnsafePath { name: name.into() }
    }

    /// Replace the context of an end-of-stream error; other errors pass
    /// through untouched.
    pub fn in_context(self, context: &'static str) -> Self {
        match self {
            Self::UnexpectedEof { bit_position, .. } => Self::UnexpectedEof {
                bit_position,
                context,
            },
            other => other,
        }
    }

    /// Whether this error means the input ended early, which usually points
    /// at an incomplete download rather than a codec mismatch.
    pub fn is_truncation(&self) -> bool {
        match self {
            Self::UnexpectedEof { .. } => true,
            Self::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}
