//! Array-positional record encoding.
//!
//! A record is a MessagePack array whose element `i` holds the field with
//! key `i`. Encoders always write every field of the layout, using nil for
//! absent optional ones. Decoders accept shorter arrays as long as every
//! required field is present (missing trailing fields are absent) and
//! discard elements past the end of the layout.
//!
//! New fields may only be appended as optional fields with the next key.
//! Keys are never reused or reordered.

use crate::codec::primitives::{Reader, Writer};
use crate::error::DecodeError;
use crate::limits::MAX_ARRAY_LEN;

/// One field of a positional record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Stable array index of the field.
    pub key: usize,
    pub name: &'static str,
    /// Whether a decoder rejects arrays too short to contain this field.
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(key: usize, name: &'static str) -> Self {
        Self {
            key,
            name,
            required: true,
        }
    }

    pub const fn optional(key: usize, name: &'static str) -> Self {
        Self {
            key,
            name,
            required: false,
        }
    }
}

/// The ordered field list of a positional record.
///
/// `fields[i].key` must equal `i`.
#[derive(Debug, Clone, Copy)]
pub struct RecordLayout {
    /// Record name used in error contexts.
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl RecordLayout {
    /// Number of fields this layout knows.
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Minimum array length a decoder accepts: one past the last required key.
    pub fn min_len(&self) -> usize {
        self.fields
            .iter()
            .rposition(|f| f.required)
            .map_or(0, |i| i + 1)
    }

    /// Writes the array header. The caller then writes exactly
    /// [`len`](Self::len) values in key order.
    pub fn write_header(&self, writer: &mut Writer) {
        writer.write_array_len(self.len());
    }

    /// Reads the array header and returns a reader over the fields.
    pub fn read<'r, 'a>(&self, reader: &'r mut Reader<'a>) -> Result<RecordReader<'r, 'a>, DecodeError> {
        let declared = reader.read_array_len(MAX_ARRAY_LEN, self.name)?;
        let min = self.min_len();
        if declared < min {
            return Err(DecodeError::ArrayTooShort {
                context: self.name,
                len: declared,
                min,
            });
        }
        Ok(RecordReader {
            reader,
            layout: *self,
            declared,
            next: 0,
        })
    }
}

/// Reads the fields of one positional record in key order.
///
/// Call [`field`](Self::field) or [`optional`](Self::optional) once per
/// layout field, then [`finish`](Self::finish) to discard unknown trailing
/// elements.
#[derive(Debug)]
pub struct RecordReader<'r, 'a> {
    reader: &'r mut Reader<'a>,
    layout: RecordLayout,
    declared: usize,
    next: usize,
}

impl<'r, 'a> RecordReader<'r, 'a> {
    /// Number of elements the array declares.
    pub fn declared_len(&self) -> usize {
        self.declared
    }

    /// Advances to the next layout field. Returns its name and whether the
    /// array contains it.
    fn advance(&mut self) -> (&'static str, bool) {
        let index = self.next;
        self.next += 1;
        let name = self
            .layout
            .fields
            .get(index)
            .map_or(self.layout.name, |f| f.name);
        (name, index < self.declared)
    }

    /// Reads the next field, which must be present.
    ///
    /// `read` receives the reader and the field name for error contexts.
    pub fn field<T>(
        &mut self,
        read: impl FnOnce(&mut Reader<'a>, &'static str) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        let (name, present) = self.advance();
        if !present {
            return Err(DecodeError::ArrayTooShort {
                context: self.layout.name,
                len: self.declared,
                min: self.next,
            });
        }
        read(&mut *self.reader, name)
    }

    /// Reads the next field, yielding `None` if the array is too short to
    /// contain it or it holds nil.
    pub fn optional<T>(
        &mut self,
        read: impl FnOnce(&mut Reader<'a>, &'static str) -> Result<T, DecodeError>,
    ) -> Result<Option<T>, DecodeError> {
        let (name, present) = self.advance();
        if !present || self.reader.try_read_nil() {
            return Ok(None);
        }
        read(&mut *self.reader, name).map(Some)
    }

    /// Skips any elements not consumed yet, including keys this layout does
    /// not know.
    pub fn finish(self) -> Result<(), DecodeError> {
        for _ in self.next.min(self.declared)..self.declared {
            self.reader.skip(self.layout.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIR: RecordLayout = RecordLayout {
        name: "pair",
        fields: &[
            FieldSpec::required(0, "first"),
            FieldSpec::required(1, "second"),
            FieldSpec::optional(2, "third"),
        ],
    };

    fn decode_pair(bytes: &[u8]) -> Result<(i32, i32, Option<i32>), DecodeError> {
        let mut reader = Reader::new(bytes);
        let mut rec = PAIR.read(&mut reader)?;
        let first = rec.field(|r, name| r.read_i32(name))?;
        let second = rec.field(|r, name| r.read_i32(name))?;
        let third = rec.optional(|r, name| r.read_i32(name))?;
        rec.finish()?;
        assert!(reader.is_empty());
        Ok((first, second, third))
    }

    #[test]
    fn test_min_len() {
        assert_eq!(PAIR.len(), 3);
        assert_eq!(PAIR.min_len(), 2);
    }

    #[test]
    fn test_full_record() {
        let mut w = Writer::new();
        PAIR.write_header(&mut w);
        w.write_int(1);
        w.write_int(2);
        w.write_int(3);
        assert_eq!(decode_pair(w.as_bytes()).unwrap(), (1, 2, Some(3)));
    }

    #[test]
    fn test_missing_trailing_optional_is_absent() {
        let mut w = Writer::new();
        w.write_array_len(2);
        w.write_int(1);
        w.write_int(2);
        assert_eq!(decode_pair(w.as_bytes()).unwrap(), (1, 2, None));
    }

    #[test]
    fn test_nil_optional_is_absent() {
        let mut w = Writer::new();
        PAIR.write_header(&mut w);
        w.write_int(1);
        w.write_int(2);
        w.write_nil();
        assert_eq!(decode_pair(w.as_bytes()).unwrap(), (1, 2, None));
    }

    #[test]
    fn test_unknown_trailing_fields_skipped() {
        let mut w = Writer::new();
        w.write_array_len(5);
        w.write_int(1);
        w.write_int(2);
        w.write_int(3);
        w.write_str("from a newer writer");
        w.write_array_len(2);
        w.write_int(9);
        w.write_nil();
        assert_eq!(decode_pair(w.as_bytes()).unwrap(), (1, 2, Some(3)));
    }

    #[test]
    fn test_too_short_rejected() {
        let mut w = Writer::new();
        w.write_array_len(1);
        w.write_int(1);
        assert!(matches!(
            decode_pair(w.as_bytes()),
            Err(DecodeError::ArrayTooShort {
                context: "pair",
                len: 1,
                min: 2
            })
        ));
    }

    #[test]
    fn test_nil_required_rejected() {
        let mut w = Writer::new();
        PAIR.write_header(&mut w);
        w.write_nil();
        w.write_int(2);
        w.write_nil();
        assert!(matches!(
            decode_pair(w.as_bytes()),
            Err(DecodeError::UnexpectedMarker {
                context: "first",
                marker: 0xc0
            })
        ));
    }

    #[test]
    fn test_finish_skips_unread_fields() {
        let mut w = Writer::new();
        PAIR.write_header(&mut w);
        w.write_int(1);
        w.write_str("skipped");
        w.write_int(3);
        w.write_int(77);

        let mut reader = Reader::new(w.as_bytes());
        let mut rec = PAIR.read(&mut reader).unwrap();
        assert_eq!(rec.field(|r, name| r.read_i32(name)).unwrap(), 1);
        rec.finish().unwrap();
        assert_eq!(reader.read_i32("after").unwrap(), 77);
    }
}
