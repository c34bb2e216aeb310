//! LZ4 envelopes around a MessagePack payload.
//!
//! Two envelopes are understood, both themselves valid MessagePack:
//!
//! - block array: `array(n + 1) [ext 98 (int32 len_1 .. int32 len_n), bin block_1 .. bin block_n]`,
//!   each block the raw LZ4 compression of at most [`LZ4_BLOCK_SIZE`] payload bytes;
//! - single block: `ext 99 (int32 len, lz4 block)`.
//!
//! Payloads shorter than [`LZ4_MIN_LENGTH`] are stored without an envelope,
//! so readers must accept raw MessagePack as well.

use std::borrow::Cow;

use crate::codec::primitives::{Reader, Writer, marker};
use crate::error::DecodeError;
use crate::limits::{
    EXT_LZ4_BLOCK, EXT_LZ4_BLOCK_ARRAY, LZ4_BLOCK_SIZE, LZ4_MIN_LENGTH, MAX_BIN_LEN,
    MAX_LZ4_BLOCKS, MAX_PAYLOAD_SIZE,
};

/// Which envelope, if any, a byte sequence starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    BlockArray,
    Block,
    Raw,
}

/// Identifies the envelope at the start of `bytes` without consuming it.
pub fn detect(bytes: &[u8]) -> Envelope {
    let mut reader = Reader::new(bytes);
    match reader.peek_byte("envelope") {
        Ok(m) if (marker::FIXARRAY..=0x9f).contains(&m) || m == marker::ARRAY16 || m == marker::ARRAY32 => {
            let is_block_array = reader.read_array_len(usize::MAX, "envelope").is_ok()
                && matches!(reader.read_ext_header("envelope"), Ok((EXT_LZ4_BLOCK_ARRAY, _)));
            if is_block_array {
                Envelope::BlockArray
            } else {
                Envelope::Raw
            }
        }
        Ok(_) => match reader.read_ext_header("envelope") {
            Ok((EXT_LZ4_BLOCK, _)) => Envelope::Block,
            _ => Envelope::Raw,
        },
        Err(_) => Envelope::Raw,
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Wraps `payload` in the block-array envelope.
pub fn compress_block_array(payload: &[u8]) -> Vec<u8> {
    if payload.len() < LZ4_MIN_LENGTH {
        return payload.to_vec();
    }

    let chunks: Vec<&[u8]> = payload.chunks(LZ4_BLOCK_SIZE).collect();
    let mut writer = Writer::with_capacity(payload.len() / 2 + 16);
    writer.write_array_len(chunks.len() + 1);
    writer.write_ext_header(EXT_LZ4_BLOCK_ARRAY, 5 * chunks.len());
    for chunk in &chunks {
        writer.write_i32_fixed(chunk.len() as i32);
    }
    for chunk in &chunks {
        writer.write_bin(&lz4_flex::block::compress(chunk));
    }
    writer.into_bytes()
}

/// Wraps `payload` in the single-block envelope.
pub fn compress_block(payload: &[u8]) -> Vec<u8> {
    if payload.len() < LZ4_MIN_LENGTH {
        return payload.to_vec();
    }

    let block = lz4_flex::block::compress(payload);
    let mut writer = Writer::with_capacity(block.len() + 16);
    writer.write_ext_header(EXT_LZ4_BLOCK, 5 + block.len());
    writer.write_i32_fixed(payload.len() as i32);
    writer.write_bytes(&block);
    writer.into_bytes()
}

// =============================================================================
// DECODING
// =============================================================================

/// Removes whichever envelope `bytes` carries. Raw input is borrowed.
pub fn decompress(bytes: &[u8]) -> Result<Cow<'_, [u8]>, DecodeError> {
    match detect(bytes) {
        Envelope::BlockArray => decompress_block_array(bytes).map(Cow::Owned),
        Envelope::Block => decompress_block(bytes).map(Cow::Owned),
        Envelope::Raw => Ok(Cow::Borrowed(bytes)),
    }
}

fn read_declared_len(reader: &mut Reader<'_>, total: usize) -> Result<usize, DecodeError> {
    let len = reader.read_i32("lz4 length")?;
    let len = usize::try_from(len).map_err(|_| DecodeError::IntegerOutOfRange {
        context: "lz4 length",
        value: len as i128,
    })?;
    if total + len > MAX_PAYLOAD_SIZE {
        return Err(DecodeError::LengthExceedsLimit {
            field: "payload",
            len: total + len,
            max: MAX_PAYLOAD_SIZE,
        });
    }
    Ok(len)
}

fn decompress_one(block: &[u8], declared: usize, out: &mut Vec<u8>) -> Result<(), DecodeError> {
    let decompressed = lz4_flex::block::decompress(block, declared)
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;
    if decompressed.len() != declared {
        return Err(DecodeError::UncompressedSizeMismatch {
            declared,
            actual: decompressed.len(),
        });
    }
    out.extend_from_slice(&decompressed);
    Ok(())
}

fn decompress_block_array(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut reader = Reader::new(bytes);
    let count = reader.read_array_len(MAX_LZ4_BLOCKS + 1, "lz4 block array")?;
    let blocks = count.saturating_sub(1);

    let (_, header_len) = reader.read_ext_header("lz4 block array")?;
    let mut lengths_reader = Reader::new(reader.read_bytes(header_len, "lz4 block lengths")?);
    let mut lengths = Vec::with_capacity(blocks);
    let mut total = 0usize;
    while !lengths_reader.is_empty() {
        let len = read_declared_len(&mut lengths_reader, total)?;
        total += len;
        lengths.push(len);
    }
    if lengths.len() != blocks {
        return Err(DecodeError::ArrayTooShort {
            context: "lz4 block lengths",
            len: lengths.len(),
            min: blocks,
        });
    }

    let mut out = Vec::with_capacity(total);
    for declared in lengths {
        let block = reader.read_bin(MAX_BIN_LEN, "lz4 block")?;
        decompress_one(block, declared, &mut out)?;
    }
    Ok(out)
}

fn decompress_block(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut reader = Reader::new(bytes);
    let (_, len) = reader.read_ext_header("lz4 block")?;
    let mut body = Reader::new(reader.read_bytes(len, "lz4 block")?);
    let declared = read_declared_len(&mut body, 0)?;

    let mut out = Vec::with_capacity(declared);
    decompress_one(body.remaining(), declared, &mut out)?;
    Ok(out)
}
