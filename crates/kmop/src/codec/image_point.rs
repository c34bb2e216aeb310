//! Image point encoding with a nibble-packed offset.
//!
//! Wire shape: `[[center_x, center_y], packed]` or nil. `packed` holds the
//! offset's x in the high nibble and y in the low nibble, each rebased by
//! +8 so that [-8, 7] maps onto [0, 15]. Offsets outside that range are
//! masked to 4 bits and therefore wrap: 10 packs like -6, -10 like 6.

use crate::codec::positional::{FieldSpec, RecordLayout};
use crate::codec::primitives::{Reader, Writer};
use crate::error::DecodeError;
use crate::model::{ImagePoint, Point2};

pub const POINT_LAYOUT: RecordLayout = RecordLayout {
    name: "point",
    fields: &[FieldSpec::required(0, "x"), FieldSpec::required(1, "y")],
};

pub const IMAGE_POINT_LAYOUT: RecordLayout = RecordLayout {
    name: "image_point",
    fields: &[
        FieldSpec::required(0, "center"),
        FieldSpec::required(1, "offset"),
    ],
};

const NIBBLE_BIAS: i32 = 8;

#[inline]
fn pack_nibble(v: i32) -> u8 {
    (v.wrapping_add(NIBBLE_BIAS) & 0x0f) as u8
}

#[inline]
fn unpack_nibble(n: u8) -> i32 {
    (n & 0x0f) as i32 - NIBBLE_BIAS
}

/// Packs an offset into one byte. Components outside [-8, 7] wrap.
pub fn pack_offset(offset: Point2) -> u8 {
    (pack_nibble(offset.x) << 4) | pack_nibble(offset.y)
}

/// Unpacks a byte produced by [`pack_offset`].
pub fn unpack_offset(packed: u8) -> Point2 {
    Point2::new(unpack_nibble(packed >> 4), unpack_nibble(packed))
}

/// Writes a point as `[x, y]`.
pub fn encode_point(writer: &mut Writer, point: Point2) {
    POINT_LAYOUT.write_header(writer);
    writer.write_int(point.x as i64);
    writer.write_int(point.y as i64);
}

/// Reads a point written by [`encode_point`]. Nil is rejected.
pub fn decode_point(reader: &mut Reader<'_>) -> Result<Point2, DecodeError> {
    let mut rec = POINT_LAYOUT.read(reader)?;
    let x = rec.field(|r, name| r.read_i32(name))?;
    let y = rec.field(|r, name| r.read_i32(name))?;
    rec.finish()?;
    Ok(Point2::new(x, y))
}

/// Writes an image point, or a single nil marker for `None`.
pub fn encode_image_point(writer: &mut Writer, point: Option<&ImagePoint>) {
    let Some(point) = point else {
        writer.write_nil();
        return;
    };
    IMAGE_POINT_LAYOUT.write_header(writer);
    encode_point(writer, point.center);
    writer.write_uint(pack_offset(point.offset) as u64);
}

/// Reads an image point written by [`encode_image_point`].
///
/// Nil yields `None`. Arrays with fewer than two elements are rejected;
/// extra elements are skipped. The packed offset must be an integer in
/// 0..=255.
pub fn decode_image_point(reader: &mut Reader<'_>) -> Result<Option<ImagePoint>, DecodeError> {
    if reader.try_read_nil() {
        return Ok(None);
    }
    let mut rec = IMAGE_POINT_LAYOUT.read(reader)?;
    let center = rec.field(|r, _| decode_point(r))?;
    let packed = rec.field(|r, name| r.read_u8(name))?;
    rec.finish()?;
    Ok(Some(ImagePoint::new(center, unpack_offset(packed))))
}

/// Encodes an image point on its own.
pub fn image_point_to_bytes(point: Option<&ImagePoint>) -> Vec<u8> {
    let mut writer = Writer::with_capacity(16);
    encode_image_point(&mut writer, point);
    writer.into_bytes()
}

/// Decodes an image point from bytes produced by [`image_point_to_bytes`].
pub fn image_point_from_bytes(bytes: &[u8]) -> Result<Option<ImagePoint>, DecodeError> {
    decode_image_point(&mut Reader::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pack_formula() {
        assert_eq!(pack_offset(Point2::new(-8, -8)), 0x00);
        assert_eq!(pack_offset(Point2::new(7, 7)), 0xff);
        assert_eq!(pack_offset(Point2::new(0, 0)), 0x88);
        assert_eq!(pack_offset(Point2::new(-5, 3)), 0x3b);
        assert_eq!(unpack_offset(0x33), Point2::new(-5, -5));
    }

    #[test]
    fn test_out_of_range_wraps() {
        assert_eq!(unpack_offset(pack_offset(Point2::new(10, 0))).x, -6);
        assert_eq!(unpack_offset(pack_offset(Point2::new(-10, 0))).x, 6);
        assert_eq!(pack_offset(Point2::new(10, -10)), pack_offset(Point2::new(-6, 6)));
        assert_eq!(
            unpack_offset(pack_offset(Point2::new(i32::MAX, i32::MIN))),
            Point2::new(-1, 0)
        );
    }

    #[test]
    fn test_wire_shape() {
        let point = ImagePoint::new(Point2::new(100, 200), Point2::new(-5, -5));
        assert_eq!(
            image_point_to_bytes(Some(&point)),
            vec![0x92, 0x92, 0x64, 0xcc, 0xc8, 0x33]
        );

        // Packed bytes above 0x7f take the uint8 form.
        let point = ImagePoint::new(Point2::new(1, 2), Point2::new(7, 7));
        assert_eq!(image_point_to_bytes(Some(&point)), vec![0x92, 0x92, 0x01, 0x02, 0xcc, 0xff]);
    }

    #[test]
    fn test_absent_is_single_nil() {
        let bytes = image_point_to_bytes(None);
        assert_eq!(bytes, vec![0xc0]);
        assert_eq!(image_point_from_bytes(&bytes).unwrap(), None);
    }

    #[test]
    fn test_trailing_element_discarded() {
        let mut w = Writer::new();
        w.write_array_len(3);
        encode_point(&mut w, Point2::new(100, 200));
        w.write_uint(0x33);
        w.write_int(999);
        w.write_int(1);

        let mut reader = Reader::new(w.as_bytes());
        let decoded = decode_image_point(&mut reader).unwrap().unwrap();
        assert_eq!(decoded.center, Point2::new(100, 200));
        assert_eq!(decoded.offset, unpack_offset(0x33));
        assert_eq!(reader.read_i32("next").unwrap(), 1);
    }

    #[test]
    fn test_single_element_rejected() {
        let bytes = [0x91, 0x00];
        assert!(matches!(
            image_point_from_bytes(&bytes),
            Err(DecodeError::ArrayTooShort {
                context: "image_point",
                len: 1,
                min: 2
            })
        ));
    }

    #[test]
    fn test_packed_byte_out_of_range_rejected() {
        let mut w = Writer::new();
        w.write_array_len(2);
        encode_point(&mut w, Point2::new(0, 0));
        w.write_int(256);
        assert!(matches!(
            image_point_from_bytes(w.as_bytes()),
            Err(DecodeError::IntegerOutOfRange {
                context: "offset",
                value: 256
            })
        ));
    }

    #[test]
    fn test_negative_center_roundtrip() {
        let point = ImagePoint::new(Point2::new(-40, 70000), Point2::new(1, -1));
        let decoded = image_point_from_bytes(&image_point_to_bytes(Some(&point))).unwrap();
        assert_eq!(decoded, Some(point));
    }

    proptest! {
        #[test]
        fn prop_in_range_roundtrip(
            cx in any::<i32>(),
            cy in any::<i32>(),
            ox in -8i32..=7,
            oy in -8i32..=7,
        ) {
            let point = ImagePoint::new(Point2::new(cx, cy), Point2::new(ox, oy));
            let decoded = image_point_from_bytes(&image_point_to_bytes(Some(&point))).unwrap();
            prop_assert_eq!(decoded, Some(point));
        }

        #[test]
        fn prop_wraparound_law(o in any::<i32>()) {
            let expected = (o as i64 + 8).rem_euclid(16) - 8;
            prop_assert_eq!(unpack_offset(pack_offset(Point2::new(o, o))).x as i64, expected);
            prop_assert_eq!(unpack_offset(pack_offset(Point2::new(o, o))).y as i64, expected);
        }
    }
}
