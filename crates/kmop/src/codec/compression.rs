//! Payload compression transforms.
//!
//! Each [`CompressionMode`] maps to one [`PayloadTransform`], which wraps an
//! output stream for writing and an input stream for reading. The container
//! picks the transform from the header and never sees the algorithm.

use std::io::{self, Cursor, Read, Write};

use brotli::enc::BrotliEncoderParams;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::codec::lz4;
use crate::error::DecodeError;
use crate::limits::MAX_PAYLOAD_SIZE;
use crate::model::CompressionMode;

const BROTLI_BUFFER_SIZE: usize = 4096;
const BROTLI_QUALITY: i32 = 11;
const BROTLI_LG_WINDOW: i32 = 22;

/// A compressing writer that must be finished to flush trailing data.
pub trait PayloadSink: Write {
    /// Writes any buffered or trailing bytes to the wrapped stream.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// Compression strategy for the container payload.
pub trait PayloadTransform: Sync {
    fn mode(&self) -> CompressionMode;

    /// Wraps `inner` so that bytes written to the sink reach it compressed.
    fn wrap_writer<'w>(&self, inner: &'w mut dyn Write) -> Box<dyn PayloadSink + 'w>;

    /// Wraps `inner` so that reading yields the decompressed payload.
    fn wrap_reader<'r>(&self, inner: &'r mut dyn Read) -> Result<Box<dyn Read + 'r>, DecodeError>;
}

static TRANSFORMS: [&dyn PayloadTransform; 4] = [&Identity, &Lz4BlockArray, &GZip, &Brotli];

/// Returns the transform for `mode`.
pub fn transform_for(mode: CompressionMode) -> &'static dyn PayloadTransform {
    TRANSFORMS[mode.to_wire() as usize]
}

/// Reads all of `reader`, failing once more than `MAX_PAYLOAD_SIZE` bytes
/// arrive. Stream errors are converted with `on_io`.
pub(crate) fn read_bounded(
    reader: &mut dyn Read,
    field: &'static str,
    on_io: fn(io::Error) -> DecodeError,
) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    reader
        .take(MAX_PAYLOAD_SIZE as u64 + 1)
        .read_to_end(&mut out)
        .map_err(on_io)?;
    if out.len() > MAX_PAYLOAD_SIZE {
        return Err(DecodeError::LengthExceedsLimit {
            field,
            len: out.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }
    Ok(out)
}

/// Collects the whole payload, then compresses it in one call on finish.
struct BufferedSink<'w> {
    inner: &'w mut dyn Write,
    buf: Vec<u8>,
    compress: fn(&[u8], &mut dyn Write) -> io::Result<()>,
}

impl<'w> BufferedSink<'w> {
    fn boxed(
        inner: &'w mut dyn Write,
        compress: fn(&[u8], &mut dyn Write) -> io::Result<()>,
    ) -> Box<dyn PayloadSink + 'w> {
        Box::new(BufferedSink {
            inner,
            buf: Vec::new(),
            compress,
        })
    }
}

impl Write for BufferedSink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl PayloadSink for BufferedSink<'_> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let BufferedSink {
            inner,
            buf,
            compress,
        } = *self;
        compress(&buf, &mut *inner)?;
        inner.flush()
    }
}

// =============================================================================
// NONE
// =============================================================================

struct Identity;

struct PassThrough<'w>(&'w mut dyn Write);

impl Write for PassThrough<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl PayloadSink for PassThrough<'_> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        self.0.flush()
    }
}

impl PayloadTransform for Identity {
    fn mode(&self) -> CompressionMode {
        CompressionMode::None
    }

    fn wrap_writer<'w>(&self, inner: &'w mut dyn Write) -> Box<dyn PayloadSink + 'w> {
        Box::new(PassThrough(inner))
    }

    fn wrap_reader<'r>(&self, inner: &'r mut dyn Read) -> Result<Box<dyn Read + 'r>, DecodeError> {
        Ok(Box::new(inner))
    }
}

// =============================================================================
// LZ4 BLOCK ARRAY
// =============================================================================

struct Lz4BlockArray;

// The envelope needs every block length up front.
fn compress_lz4(payload: &[u8], out: &mut dyn Write) -> io::Result<()> {
    out.write_all(&lz4::compress_block_array(payload))
}

impl PayloadTransform for Lz4BlockArray {
    fn mode(&self) -> CompressionMode {
        CompressionMode::Lz4BlockArray
    }

    fn wrap_writer<'w>(&self, inner: &'w mut dyn Write) -> Box<dyn PayloadSink + 'w> {
        BufferedSink::boxed(inner, compress_lz4)
    }

    fn wrap_reader<'r>(&self, inner: &'r mut dyn Read) -> Result<Box<dyn Read + 'r>, DecodeError> {
        let compressed = read_bounded(inner, "compressed payload", DecodeError::from)?;
        let payload = lz4::decompress(&compressed)?.into_owned();
        Ok(Box::new(Cursor::new(payload)))
    }
}

// =============================================================================
// GZIP
// =============================================================================

struct GZip;

impl<W: Write> PayloadSink for GzEncoder<W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut inner = GzEncoder::finish(*self)?;
        inner.flush()
    }
}

impl PayloadTransform for GZip {
    fn mode(&self) -> CompressionMode {
        CompressionMode::GZip
    }

    fn wrap_writer<'w>(&self, inner: &'w mut dyn Write) -> Box<dyn PayloadSink + 'w> {
        Box::new(GzEncoder::new(inner, Compression::best()))
    }

    fn wrap_reader<'r>(&self, inner: &'r mut dyn Read) -> Result<Box<dyn Read + 'r>, DecodeError> {
        Ok(Box::new(GzDecoder::new(inner)))
    }
}

// =============================================================================
// BROTLI
// =============================================================================

struct Brotli;

fn compress_brotli(mut payload: &[u8], mut out: &mut dyn Write) -> io::Result<()> {
    let mut params = BrotliEncoderParams::default();
    params.quality = BROTLI_QUALITY;
    params.lgwin = BROTLI_LG_WINDOW;
    brotli::BrotliCompress(&mut payload, &mut out, &params)?;
    Ok(())
}

impl PayloadTransform for Brotli {
    fn mode(&self) -> CompressionMode {
        CompressionMode::Brotli
    }

    fn wrap_writer<'w>(&self, inner: &'w mut dyn Write) -> Box<dyn PayloadSink + 'w> {
        BufferedSink::boxed(inner, compress_brotli)
    }

    fn wrap_reader<'r>(&self, inner: &'r mut dyn Read) -> Result<Box<dyn Read + 'r>, DecodeError> {
        Ok(Box::new(brotli::Decompressor::new(inner, BROTLI_BUFFER_SIZE)))
    }
}
