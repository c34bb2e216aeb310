//! Error types for KMOP encoding/decoding and validation.

use thiserror::Error;

use crate::model::{Point2, StationType};

/// Broad classification of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Magic mismatch, truncated or corrupt bytes, short arrays.
    Format,
    /// The header parsed but declares a version this crate does not read.
    UnsupportedVersion,
    /// The underlying stream failed.
    Io,
}

/// Error during binary decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("invalid magic bytes: expected KMOP, found {found:?}")]
    InvalidMagic { found: Vec<u8> },

    #[error("unsupported container version: {version}")]
    UnsupportedVersion { version: i128 },

    #[error("unsupported compression mode: {mode}")]
    UnsupportedCompressionMode { mode: i128 },

    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("unexpected marker 0x{marker:02x} while reading {context}")]
    UnexpectedMarker { context: &'static str, marker: u8 },

    #[error("{context} has {len} elements, at least {min} required")]
    ArrayTooShort {
        context: &'static str,
        len: usize,
        min: usize,
    },

    #[error("{context} value {value} does not fit the target integer type")]
    IntegerOutOfRange { context: &'static str, value: i128 },

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("unexpected ext type {ext_type} while reading {context}")]
    UnexpectedExtType { context: &'static str, ext_type: i8 },

    #[error("malformed timestamp: {context}")]
    InvalidTimestamp { context: &'static str },

    #[error("nesting deeper than {max} while skipping an unknown value")]
    NestingTooDeep { max: usize },

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("decompressed size {actual} doesn't match declared {declared}")]
    UncompressedSizeMismatch { declared: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("header: {0}")]
    Header(Box<DecodeError>),

    #[error("payload: {0}")]
    Payload(Box<DecodeError>),

    #[error("record {index}: {source}")]
    Record {
        index: usize,
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Returns the classification of this error, looking through stage wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            DecodeError::Io(_) => ErrorKind::Io,
            DecodeError::Header(inner) | DecodeError::Payload(inner) => inner.kind(),
            DecodeError::Record { source, .. } => source.kind(),
            _ => ErrorKind::Format,
        }
    }

    /// Strips stage wrappers and returns the underlying failure.
    pub fn root(&self) -> &DecodeError {
        match self {
            DecodeError::Header(inner) | DecodeError::Payload(inner) => inner.root(),
            DecodeError::Record { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn in_header(self) -> Self {
        DecodeError::Header(Box::new(self))
    }

    pub(crate) fn in_payload(self) -> Self {
        DecodeError::Payload(Box::new(self))
    }

    pub(crate) fn in_record(self, index: usize) -> Self {
        DecodeError::Record {
            index,
            source: Box::new(self),
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            DecodeError::UnexpectedEof { context: "stream" }
        } else {
            DecodeError::Io(e.to_string())
        }
    }
}

/// Error during binary encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("timestamp nanoseconds {nanos} out of range")]
    InvalidTimestamp { nanos: u32 },

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for EncodeError {
    fn from(e: std::io::Error) -> Self {
        EncodeError::Io(e.to_string())
    }
}

/// Error during semantic validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("station code {code:?} appears more than once")]
    DuplicateCode { code: String },

    #[error("station {name:?} has an empty code")]
    EmptyCode { name: String },

    #[error("station {code:?} offset {offset} is outside [-8, 7] and would wrap")]
    OffsetOutOfRange { code: String, offset: Point2 },

    #[error("station {code:?} has unrecognized type {station_type:?}")]
    UnrecognizedType {
        code: String,
        station_type: StationType,
    },

    #[error("station {code:?} {field} ({latitude}, {longitude}) is not a valid coordinate")]
    InvalidCoordinate {
        code: String,
        field: &'static str,
        latitude: f32,
        longitude: f32,
    },
}
