//! Primitive MessagePack encoding/decoding for KMOP.
//!
//! Implements the subset of MessagePack the station formats use: nil, bool,
//! integers, floats, strings, binaries, arrays, ext values and the timestamp
//! extension, plus skipping of arbitrary values (maps included) so unknown
//! trailing fields can be discarded.

use crate::error::{DecodeError, EncodeError};
use crate::limits::{EXT_TIMESTAMP, MAX_SKIP_DEPTH};
use crate::model::Timestamp;

/// MessagePack format markers.
pub mod marker {
    pub const POSITIVE_FIXINT_MAX: u8 = 0x7f;
    pub const FIXMAP: u8 = 0x80;
    pub const FIXARRAY: u8 = 0x90;
    pub const FIXSTR: u8 = 0xa0;
    pub const NIL: u8 = 0xc0;
    pub const NEVER_USED: u8 = 0xc1;
    pub const FALSE: u8 = 0xc2;
    pub const TRUE: u8 = 0xc3;
    pub const BIN8: u8 = 0xc4;
    pub const BIN16: u8 = 0xc5;
    pub const BIN32: u8 = 0xc6;
    pub const EXT8: u8 = 0xc7;
    pub const EXT16: u8 = 0xc8;
    pub const EXT32: u8 = 0xc9;
    pub const FLOAT32: u8 = 0xca;
    pub const FLOAT64: u8 = 0xcb;
    pub const UINT8: u8 = 0xcc;
    pub const UINT16: u8 = 0xcd;
    pub const UINT32: u8 = 0xce;
    pub const UINT64: u8 = 0xcf;
    pub const INT8: u8 = 0xd0;
    pub const INT16: u8 = 0xd1;
    pub const INT32: u8 = 0xd2;
    pub const INT64: u8 = 0xd3;
    pub const FIXEXT1: u8 = 0xd4;
    pub const FIXEXT2: u8 = 0xd5;
    pub const FIXEXT4: u8 = 0xd6;
    pub const FIXEXT8: u8 = 0xd7;
    pub const FIXEXT16: u8 = 0xd8;
    pub const STR8: u8 = 0xd9;
    pub const STR16: u8 = 0xda;
    pub const STR32: u8 = 0xdb;
    pub const ARRAY16: u8 = 0xdc;
    pub const ARRAY32: u8 = 0xdd;
    pub const MAP16: u8 = 0xde;
    pub const MAP32: u8 = 0xdf;
    pub const NEGATIVE_FIXINT_MIN: u8 = 0xe0;
}

use marker::*;

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding MessagePack data.
///
/// Wraps a byte slice and provides methods for reading values with bounds
/// checking. Every method takes a context string naming what is being read,
/// which ends up in the error.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the next byte without consuming it.
    #[inline]
    pub fn peek_byte(&self, context: &'static str) -> Result<u8, DecodeError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::UnexpectedEof { context })
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        let byte = self.peek_byte(context)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining_len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    #[inline]
    fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, context)?);
        Ok(out)
    }

    fn read_u8_be(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        self.read_byte(context)
    }

    fn read_u16_be(&mut self, context: &'static str) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.read_array(context)?))
    }

    fn read_u32_be(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.read_array(context)?))
    }

    fn read_u64_be(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        Ok(u64::from_be_bytes(self.read_array(context)?))
    }

    /// Consumes a nil marker if one is next. Returns whether it did.
    #[inline]
    pub fn try_read_nil(&mut self) -> bool {
        if self.data.get(self.pos) == Some(&NIL) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Reads a boolean.
    pub fn read_bool(&mut self, context: &'static str) -> Result<bool, DecodeError> {
        match self.read_byte(context)? {
            FALSE => Ok(false),
            TRUE => Ok(true),
            marker => Err(DecodeError::UnexpectedMarker { context, marker }),
        }
    }

    /// Reads any integer form, widened so every u64 and i64 fits.
    pub fn read_integer(&mut self, context: &'static str) -> Result<i128, DecodeError> {
        let m = self.read_byte(context)?;
        let value = match m {
            0x00..=POSITIVE_FIXINT_MAX => m as i128,
            NEGATIVE_FIXINT_MIN..=0xff => (m as i8) as i128,
            UINT8 => self.read_u8_be(context)? as i128,
            UINT16 => self.read_u16_be(context)? as i128,
            UINT32 => self.read_u32_be(context)? as i128,
            UINT64 => self.read_u64_be(context)? as i128,
            INT8 => (self.read_u8_be(context)? as i8) as i128,
            INT16 => (self.read_u16_be(context)? as i16) as i128,
            INT32 => (self.read_u32_be(context)? as i32) as i128,
            INT64 => (self.read_u64_be(context)? as i64) as i128,
            marker => return Err(DecodeError::UnexpectedMarker { context, marker }),
        };
        Ok(value)
    }

    fn read_integer_as<T: TryFrom<i128>>(&mut self, context: &'static str) -> Result<T, DecodeError> {
        let value = self.read_integer(context)?;
        T::try_from(value).map_err(|_| DecodeError::IntegerOutOfRange { context, value })
    }

    /// Reads an integer that must fit in a u8.
    pub fn read_u8(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        self.read_integer_as(context)
    }

    /// Reads an integer that must fit in a u32.
    pub fn read_u32(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        self.read_integer_as(context)
    }

    /// Reads an integer that must fit in an i32.
    pub fn read_i32(&mut self, context: &'static str) -> Result<i32, DecodeError> {
        self.read_integer_as(context)
    }

    /// Reads an integer that must fit in an i64.
    pub fn read_i64(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        self.read_integer_as(context)
    }

    /// Reads a float. float64 and integer forms are converted.
    pub fn read_f32(&mut self, context: &'static str) -> Result<f32, DecodeError> {
        match self.peek_byte(context)? {
            FLOAT32 => {
                self.pos += 1;
                Ok(f32::from_bits(self.read_u32_be(context)?))
            }
            FLOAT64 => {
                self.pos += 1;
                Ok(f64::from_bits(self.read_u64_be(context)?) as f32)
            }
            _ => Ok(self.read_integer(context)? as f32),
        }
    }

    /// Reads a float. float32 and integer forms are converted.
    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        match self.peek_byte(context)? {
            FLOAT32 => {
                self.pos += 1;
                Ok(f32::from_bits(self.read_u32_be(context)?) as f64)
            }
            FLOAT64 => {
                self.pos += 1;
                Ok(f64::from_bits(self.read_u64_be(context)?))
            }
            _ => Ok(self.read_integer(context)? as f64),
        }
    }

    fn check_len(len: usize, max_len: usize, field: &'static str) -> Result<usize, DecodeError> {
        if len > max_len {
            return Err(DecodeError::LengthExceedsLimit {
                field,
                len,
                max: max_len,
            });
        }
        Ok(len)
    }

    /// Reads a UTF-8 string, borrowing from the input.
    pub fn read_str(&mut self, max_len: usize, field: &'static str) -> Result<&'a str, DecodeError> {
        let len = match self.read_byte(field)? {
            m @ FIXSTR..=0xbf => (m & 0x1f) as usize,
            STR8 => self.read_u8_be(field)? as usize,
            STR16 => self.read_u16_be(field)? as usize,
            STR32 => self.read_u32_be(field)? as usize,
            marker => return Err(DecodeError::UnexpectedMarker { context: field, marker }),
        };
        let len = Self::check_len(len, max_len, field)?;
        let bytes = self.read_bytes(len, field)?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { field })
    }

    /// Reads a UTF-8 string into an owned String.
    #[inline]
    pub fn read_string(&mut self, max_len: usize, field: &'static str) -> Result<String, DecodeError> {
        self.read_str(max_len, field).map(str::to_string)
    }

    /// Reads a bin value, borrowing from the input.
    pub fn read_bin(&mut self, max_len: usize, field: &'static str) -> Result<&'a [u8], DecodeError> {
        let len = match self.read_byte(field)? {
            BIN8 => self.read_u8_be(field)? as usize,
            BIN16 => self.read_u16_be(field)? as usize,
            BIN32 => self.read_u32_be(field)? as usize,
            marker => return Err(DecodeError::UnexpectedMarker { context: field, marker }),
        };
        let len = Self::check_len(len, max_len, field)?;
        self.read_bytes(len, field)
    }

    /// Reads an array header and returns the declared element count.
    pub fn read_array_len(&mut self, max_len: usize, context: &'static str) -> Result<usize, DecodeError> {
        let len = match self.read_byte(context)? {
            m @ FIXARRAY..=0x9f => (m & 0x0f) as usize,
            ARRAY16 => self.read_u16_be(context)? as usize,
            ARRAY32 => self.read_u32_be(context)? as usize,
            marker => return Err(DecodeError::UnexpectedMarker { context, marker }),
        };
        Self::check_len(len, max_len, context)
    }

    /// Reads an ext header and returns `(ext_type, data_len)`.
    pub fn read_ext_header(&mut self, context: &'static str) -> Result<(i8, usize), DecodeError> {
        let len = match self.read_byte(context)? {
            FIXEXT1 => 1,
            FIXEXT2 => 2,
            FIXEXT4 => 4,
            FIXEXT8 => 8,
            FIXEXT16 => 16,
            EXT8 => self.read_u8_be(context)? as usize,
            EXT16 => self.read_u16_be(context)? as usize,
            EXT32 => self.read_u32_be(context)? as usize,
            marker => return Err(DecodeError::UnexpectedMarker { context, marker }),
        };
        let ext_type = self.read_byte(context)? as i8;
        Ok((ext_type, len))
    }

    /// Reads a value of the timestamp extension (32-, 64- or 96-bit form).
    pub fn read_timestamp(&mut self, context: &'static str) -> Result<Timestamp, DecodeError> {
        let (ext_type, len) = self.read_ext_header(context)?;
        if ext_type != EXT_TIMESTAMP {
            return Err(DecodeError::UnexpectedExtType { context, ext_type });
        }
        let (seconds, nanos) = match len {
            4 => (self.read_u32_be(context)? as i64, 0),
            8 => {
                let packed = self.read_u64_be(context)?;
                ((packed & 0x0000_0003_ffff_ffff) as i64, (packed >> 34) as u32)
            }
            12 => {
                let nanos = self.read_u32_be(context)?;
                (self.read_u64_be(context)? as i64, nanos)
            }
            _ => return Err(DecodeError::InvalidTimestamp { context: "unsupported length" }),
        };
        if nanos >= 1_000_000_000 {
            return Err(DecodeError::InvalidTimestamp { context: "nanoseconds out of range" });
        }
        Ok(Timestamp { seconds, nanos })
    }

    /// Reads and discards one complete value of any type.
    pub fn skip(&mut self, context: &'static str) -> Result<(), DecodeError> {
        self.skip_value(context, 0)
    }

    fn skip_value(&mut self, context: &'static str, depth: usize) -> Result<(), DecodeError> {
        if depth >= MAX_SKIP_DEPTH {
            return Err(DecodeError::NestingTooDeep { max: MAX_SKIP_DEPTH });
        }
        let m = self.read_byte(context)?;
        let (payload, children) = match m {
            0x00..=POSITIVE_FIXINT_MAX | NEGATIVE_FIXINT_MIN..=0xff => (0, 0),
            NIL | FALSE | TRUE => (0, 0),
            FIXMAP..=0x8f => (0, 2 * (m & 0x0f) as usize),
            FIXARRAY..=0x9f => (0, (m & 0x0f) as usize),
            FIXSTR..=0xbf => ((m & 0x1f) as usize, 0),
            BIN8 | STR8 => (self.read_u8_be(context)? as usize, 0),
            BIN16 | STR16 => (self.read_u16_be(context)? as usize, 0),
            BIN32 | STR32 => (self.read_u32_be(context)? as usize, 0),
            EXT8 => (self.read_u8_be(context)? as usize + 1, 0),
            EXT16 => (self.read_u16_be(context)? as usize + 1, 0),
            EXT32 => (self.read_u32_be(context)? as usize + 1, 0),
            FLOAT32 => (4, 0),
            FLOAT64 => (8, 0),
            UINT8 | INT8 => (1, 0),
            UINT16 | INT16 => (2, 0),
            UINT32 | INT32 => (4, 0),
            UINT64 | INT64 => (8, 0),
            FIXEXT1 => (2, 0),
            FIXEXT2 => (3, 0),
            FIXEXT4 => (5, 0),
            FIXEXT8 => (9, 0),
            FIXEXT16 => (17, 0),
            ARRAY16 => (0, self.read_u16_be(context)? as usize),
            ARRAY32 => (0, self.read_u32_be(context)? as usize),
            MAP16 => (0, 2 * self.read_u16_be(context)? as usize),
            MAP32 => (0, 2 * self.read_u32_be(context)? as usize),
            NEVER_USED => return Err(DecodeError::UnexpectedMarker { context, marker: m }),
        };
        self.read_bytes(payload, context)?;
        // Every child takes at least one byte.
        if children > self.remaining_len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        for _ in 0..children {
            self.skip_value(context, depth + 1)?;
        }
        Ok(())
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Checks an encode-side length against a limit.
pub fn check_len(field: &'static str, len: usize, max: usize) -> Result<(), EncodeError> {
    if len > max {
        return Err(EncodeError::LengthExceedsLimit { field, len, max });
    }
    Ok(())
}

/// Writer for encoding MessagePack data.
///
/// Integers are always written in their smallest form. Lengths are assumed
/// to have been checked against the limits by the caller and must fit in
/// a u32.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single raw byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    fn write_marked(&mut self, marker: u8, bytes: &[u8]) {
        self.buf.push(marker);
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_nil(&mut self) {
        self.buf.push(NIL);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(if value { TRUE } else { FALSE });
    }

    /// Writes an unsigned integer in its smallest form.
    pub fn write_uint(&mut self, value: u64) {
        if value <= POSITIVE_FIXINT_MAX as u64 {
            self.buf.push(value as u8);
        } else if value <= u8::MAX as u64 {
            self.write_marked(UINT8, &[value as u8]);
        } else if value <= u16::MAX as u64 {
            self.write_marked(UINT16, &(value as u16).to_be_bytes());
        } else if value <= u32::MAX as u64 {
            self.write_marked(UINT32, &(value as u32).to_be_bytes());
        } else {
            self.write_marked(UINT64, &value.to_be_bytes());
        }
    }

    /// Writes a signed integer in its smallest form.
    ///
    /// Non-negative values use the unsigned forms.
    pub fn write_int(&mut self, value: i64) {
        if value >= 0 {
            self.write_uint(value as u64);
        } else if value >= -32 {
            self.buf.push(value as i8 as u8);
        } else if value >= i8::MIN as i64 {
            self.write_marked(INT8, &[value as i8 as u8]);
        } else if value >= i16::MIN as i64 {
            self.write_marked(INT16, &(value as i16).to_be_bytes());
        } else if value >= i32::MIN as i64 {
            self.write_marked(INT32, &(value as i32).to_be_bytes());
        } else {
            self.write_marked(INT64, &value.to_be_bytes());
        }
    }

    /// Writes an int32 in the fixed 5-byte form regardless of magnitude.
    pub fn write_i32_fixed(&mut self, value: i32) {
        self.write_marked(INT32, &value.to_be_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_marked(FLOAT32, &value.to_bits().to_be_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_marked(FLOAT64, &value.to_bits().to_be_bytes());
    }

    /// Writes a UTF-8 string.
    pub fn write_str(&mut self, s: &str) {
        let len = s.len();
        if len < 32 {
            self.buf.push(FIXSTR | len as u8);
        } else if len <= u8::MAX as usize {
            self.write_marked(STR8, &[len as u8]);
        } else if len <= u16::MAX as usize {
            self.write_marked(STR16, &(len as u16).to_be_bytes());
        } else {
            self.write_marked(STR32, &(len as u32).to_be_bytes());
        }
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Writes a bin value.
    pub fn write_bin(&mut self, bytes: &[u8]) {
        let len = bytes.len();
        if len <= u8::MAX as usize {
            self.write_marked(BIN8, &[len as u8]);
        } else if len <= u16::MAX as usize {
            self.write_marked(BIN16, &(len as u16).to_be_bytes());
        } else {
            self.write_marked(BIN32, &(len as u32).to_be_bytes());
        }
        self.buf.extend_from_slice(bytes);
    }

    /// Writes an array header declaring `len` elements.
    pub fn write_array_len(&mut self, len: usize) {
        if len < 16 {
            self.buf.push(FIXARRAY | len as u8);
        } else if len <= u16::MAX as usize {
            self.write_marked(ARRAY16, &(len as u16).to_be_bytes());
        } else {
            self.write_marked(ARRAY32, &(len as u32).to_be_bytes());
        }
    }

    /// Writes an ext header for `len` data bytes of type `ext_type`.
    pub fn write_ext_header(&mut self, ext_type: i8, len: usize) {
        match len {
            1 => self.buf.push(FIXEXT1),
            2 => self.buf.push(FIXEXT2),
            4 => self.buf.push(FIXEXT4),
            8 => self.buf.push(FIXEXT8),
            16 => self.buf.push(FIXEXT16),
            _ if len <= u8::MAX as usize => self.write_marked(EXT8, &[len as u8]),
            _ if len <= u16::MAX as usize => self.write_marked(EXT16, &(len as u16).to_be_bytes()),
            _ => self.write_marked(EXT32, &(len as u32).to_be_bytes()),
        }
        self.buf.push(ext_type as u8);
    }

    /// Writes a timestamp extension value in the smallest form that holds it.
    pub fn write_timestamp(&mut self, ts: Timestamp) {
        if ts.seconds >= 0 && ts.seconds >> 34 == 0 {
            if ts.nanos == 0 && ts.seconds <= u32::MAX as i64 {
                self.write_ext_header(EXT_TIMESTAMP, 4);
                self.buf.extend_from_slice(&(ts.seconds as u32).to_be_bytes());
            } else {
                let packed = ((ts.nanos as u64) << 34) | ts.seconds as u64;
                self.write_ext_header(EXT_TIMESTAMP, 8);
                self.buf.extend_from_slice(&packed.to_be_bytes());
            }
        } else {
            self.write_ext_header(EXT_TIMESTAMP, 12);
            self.buf.extend_from_slice(&ts.nanos.to_be_bytes());
            self.buf.extend_from_slice(&ts.seconds.to_be_bytes());
        }
    }
}
