//! KMOP container reading and writing.
//!
//! Layout:
//!
//! ```text
//! "KMOP"                               4 magic bytes
//! [version, data_version, packed_at,   positional header, never compressed
//!  source, compression_mode]
//! payload                              V2 station array, through the
//!                                      transform named by compression_mode
//! ```
//!
//! Reading checks the magic before parsing anything and the version before
//! interpreting any other header field.

use std::io::{Read, Write};

use crate::codec::compression::{read_bounded, transform_for};
use crate::codec::positional::{FieldSpec, RecordLayout};
use crate::codec::primitives::{Reader, Writer, check_len};
use crate::codec::station::{decode_stations_v2, encode_stations_v2};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{FORMAT_VERSION, MAGIC, MAX_PAYLOAD_SIZE, MAX_STRING_LEN};
use crate::model::{CompressionMode, ContainerHeader, StationV2};

pub const HEADER_LAYOUT: RecordLayout = RecordLayout {
    name: "header",
    fields: &[
        FieldSpec::required(0, "version"),
        FieldSpec::required(1, "data_version"),
        FieldSpec::required(2, "packed_at"),
        FieldSpec::required(3, "source"),
        FieldSpec::required(4, "compression_mode"),
    ],
};

/// A decoded container.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub header: ContainerHeader,
    pub stations: Vec<StationV2>,
}

// =============================================================================
// DECODING
// =============================================================================

fn check_magic(found: &[u8]) -> Result<(), DecodeError> {
    if found != MAGIC {
        return Err(DecodeError::InvalidMagic {
            found: found.to_vec(),
        });
    }
    Ok(())
}

/// Decodes the positional header. Rejects unknown versions before reading
/// further fields.
pub fn decode_header(reader: &mut Reader<'_>) -> Result<ContainerHeader, DecodeError> {
    let mut rec = HEADER_LAYOUT.read(reader)?;
    let version = rec.field(|r, name| r.read_integer(name))?;
    if version != FORMAT_VERSION as i128 {
        return Err(DecodeError::UnsupportedVersion { version });
    }
    let data_version = rec.field(|r, name| r.read_string(MAX_STRING_LEN, name))?;
    let packed_at = rec.field(|r, name| r.read_timestamp(name))?;
    let source = rec.field(|r, name| r.read_string(MAX_STRING_LEN, name))?;
    let mode = rec.field(|r, name| r.read_integer(name))?;
    let compression_mode = i64::try_from(mode)
        .ok()
        .and_then(CompressionMode::from_wire)
        .ok_or(DecodeError::UnsupportedCompressionMode { mode })?;
    rec.finish()?;

    Ok(ContainerHeader {
        version: FORMAT_VERSION,
        data_version,
        packed_at,
        source,
        compression_mode,
    })
}

/// Checks the magic and decodes the header, leaving `reader` at the payload.
fn read_prelude(reader: &mut Reader<'_>) -> Result<ContainerHeader, DecodeError> {
    let available = reader.remaining_len().min(MAGIC.len());
    check_magic(reader.read_bytes(available, "magic")?)?;
    decode_header(reader).map_err(DecodeError::in_header)
}

/// Decodes only the magic and header, without touching the payload.
pub fn read_header(bytes: &[u8]) -> Result<ContainerHeader, DecodeError> {
    read_prelude(&mut Reader::new(bytes))
}

fn decode_payload(header: &ContainerHeader, mut compressed: &[u8]) -> Result<Vec<StationV2>, DecodeError> {
    let on_io: fn(std::io::Error) -> DecodeError = match header.compression_mode {
        CompressionMode::None => DecodeError::from,
        _ => |e| DecodeError::DecompressionFailed(e.to_string()),
    };
    let mut stream = transform_for(header.compression_mode).wrap_reader(&mut compressed)?;
    let payload = read_bounded(&mut stream, "payload", on_io)?;
    decode_stations_v2(&mut Reader::new(&payload))
}

/// Decodes a complete container from bytes.
pub fn decode_container(bytes: &[u8]) -> Result<Container, DecodeError> {
    let mut reader = Reader::new(bytes);
    let header = read_prelude(&mut reader)?;
    let stations = decode_payload(&header, reader.remaining()).map_err(DecodeError::in_payload)?;
    Ok(Container { header, stations })
}

/// Reads a complete container from a stream.
///
/// The four magic bytes are read and checked before anything else is
/// consumed; the rest of the stream is then read in full.
pub fn read_container<R: Read>(input: &mut R) -> Result<Container, DecodeError> {
    let mut magic = Vec::with_capacity(MAGIC.len());
    input.by_ref().take(MAGIC.len() as u64).read_to_end(&mut magic)?;
    check_magic(&magic)?;

    let mut rest = Vec::new();
    input
        .take(MAX_PAYLOAD_SIZE as u64 + 1)
        .read_to_end(&mut rest)?;
    if rest.len() > MAX_PAYLOAD_SIZE {
        return Err(DecodeError::LengthExceedsLimit {
            field: "container",
            len: rest.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let mut reader = Reader::new(&rest);
    let header = decode_header(&mut reader).map_err(DecodeError::in_header)?;
    let stations = decode_payload(&header, reader.remaining()).map_err(DecodeError::in_payload)?;
    Ok(Container { header, stations })
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes the positional header. The version is written as given.
pub fn encode_header(writer: &mut Writer, header: &ContainerHeader) -> Result<(), EncodeError> {
    check_len("data_version", header.data_version.len(), MAX_STRING_LEN)?;
    check_len("source", header.source.len(), MAX_STRING_LEN)?;
    if header.packed_at.nanos >= 1_000_000_000 {
        return Err(EncodeError::InvalidTimestamp {
            nanos: header.packed_at.nanos,
        });
    }

    HEADER_LAYOUT.write_header(writer);
    writer.write_uint(header.version as u64);
    writer.write_str(&header.data_version);
    writer.write_timestamp(header.packed_at);
    writer.write_str(&header.source);
    writer.write_uint(header.compression_mode.to_wire() as u64);
    Ok(())
}

/// Writes a container to a stream, compressing the payload with the
/// header's compression mode.
pub fn write_container<W: Write>(
    out: &mut W,
    header: &ContainerHeader,
    stations: &[StationV2],
) -> Result<(), EncodeError> {
    let mut prelude = Writer::with_capacity(64);
    prelude.write_bytes(MAGIC);
    encode_header(&mut prelude, header)?;

    let mut payload = Writer::with_capacity(stations.len() * 48 + 8);
    encode_stations_v2(&mut payload, stations)?;

    out.write_all(prelude.as_bytes())?;
    let mut sink = transform_for(header.compression_mode).wrap_writer(out);
    sink.write_all(payload.as_bytes())
        .map_err(|e| EncodeError::CompressionFailed(e.to_string()))?;
    sink.finish()
        .map_err(|e| EncodeError::CompressionFailed(e.to_string()))?;
    Ok(())
}

/// Encodes a complete container to bytes.
pub fn encode_v2_container(stations: &[StationV2], header: &ContainerHeader) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    write_container(&mut out, header, stations)?;
    Ok(out)
}
