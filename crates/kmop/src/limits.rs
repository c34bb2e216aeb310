//! Format constants and security limits for decoding.
//!
//! Every allocation driven by a length read from the wire is checked
//! against one of these bounds before it happens.

/// Magic bytes at offset 0 of every container file.
pub const MAGIC: &[u8; 4] = b"KMOP";

/// The only container version this crate reads or writes.
pub const FORMAT_VERSION: u32 = 0;

/// Maximum byte length of any string field.
pub const MAX_STRING_LEN: usize = 64 * 1024;

/// Maximum byte length of a bin value.
pub const MAX_BIN_LEN: usize = 16 * 1024 * 1024;

/// Maximum number of station records in one payload.
pub const MAX_STATIONS: usize = 1 << 20;

/// Maximum number of elements in any array other than the station list.
pub const MAX_ARRAY_LEN: usize = 1 << 16;

/// Maximum size of a decompressed payload.
pub const MAX_PAYLOAD_SIZE: usize = 256 * 1024 * 1024;

/// Maximum nesting depth when skipping unknown values.
pub const MAX_SKIP_DEPTH: usize = 64;

/// Ext type of the multi-block LZ4 envelope.
pub const EXT_LZ4_BLOCK_ARRAY: i8 = 98;

/// Ext type of the single-block LZ4 envelope.
pub const EXT_LZ4_BLOCK: i8 = 99;

/// Ext type of the MessagePack timestamp extension.
pub const EXT_TIMESTAMP: i8 = -1;

/// Payloads shorter than this are written without an LZ4 envelope.
pub const LZ4_MIN_LENGTH: usize = 64;

/// Largest slice of payload compressed into a single LZ4 block.
pub const LZ4_BLOCK_SIZE: usize = 1024 * 1024;

/// Maximum number of blocks in one LZ4 block array.
pub const MAX_LZ4_BLOCKS: usize = MAX_PAYLOAD_SIZE / LZ4_BLOCK_SIZE;
