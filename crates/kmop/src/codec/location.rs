//! Fixed-point geographic coordinates.
//!
//! A location is stored as `[lat_milli, lng_milli]`, two integers in
//! thousandths of a degree, or nil when absent. Rounding is half away from
//! zero, so a round trip is off by at most 0.0005° on each axis. Locations
//! closer than that quantization step may decode to the same value; this is
//! expected, not an error.

use crate::codec::positional::{FieldSpec, RecordLayout};
use crate::codec::primitives::{Reader, Writer};
use crate::error::DecodeError;
use crate::model::Location;

/// Fixed-point units per degree.
pub const SCALE: f64 = 1000.0;

/// Largest round-trip error on each axis, in degrees.
pub const MAX_ERROR_DEGREES: f64 = 0.5 / SCALE;

pub const LOCATION_LAYOUT: RecordLayout = RecordLayout {
    name: "location",
    fields: &[
        FieldSpec::required(0, "latitude"),
        FieldSpec::required(1, "longitude"),
    ],
};

/// Converts degrees to thousandths of a degree, rounding half away from zero.
///
/// Values beyond the `i32` range saturate; NaN maps to zero.
pub fn to_fixed(degrees: f32) -> i32 {
    (degrees as f64 * SCALE).round() as i32
}

/// Converts thousandths of a degree back to degrees.
pub fn from_fixed(value: i32) -> f32 {
    (value as f64 / SCALE) as f32
}

/// Writes a location, or a single nil marker for `None`.
pub fn encode_location(writer: &mut Writer, location: Option<&Location>) {
    let Some(location) = location else {
        writer.write_nil();
        return;
    };
    LOCATION_LAYOUT.write_header(writer);
    writer.write_int(to_fixed(location.latitude) as i64);
    writer.write_int(to_fixed(location.longitude) as i64);
}

/// Reads a location written by [`encode_location`].
///
/// Nil yields `None`. Arrays with fewer than two elements are rejected;
/// extra elements are skipped.
pub fn decode_location(reader: &mut Reader<'_>) -> Result<Option<Location>, DecodeError> {
    if reader.try_read_nil() {
        return Ok(None);
    }
    let mut rec = LOCATION_LAYOUT.read(reader)?;
    let latitude = rec.field(|r, name| r.read_i32(name))?;
    let longitude = rec.field(|r, name| r.read_i32(name))?;
    rec.finish()?;
    Ok(Some(Location::new(from_fixed(latitude), from_fixed(longitude))))
}

/// Encodes a location on its own.
pub fn location_to_bytes(location: Option<&Location>) -> Vec<u8> {
    let mut writer = Writer::with_capacity(11);
    encode_location(&mut writer, location);
    writer.into_bytes()
}

/// Decodes a location from bytes produced by [`location_to_bytes`].
pub fn location_from_bytes(bytes: &[u8]) -> Result<Option<Location>, DecodeError> {
    decode_location(&mut Reader::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wire_shape() {
        let bytes = location_to_bytes(Some(&Location::new(35.681236, 139.767125)));
        // [35681, 139767]
        assert_eq!(bytes, vec![0x92, 0xcd, 0x8b, 0x61, 0xce, 0x00, 0x02, 0x21, 0xf7]);
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        assert_eq!(to_fixed(0.0005), 1);
        assert_eq!(to_fixed(-0.0005), -1);
        assert_eq!(to_fixed(0.0004), 0);
        assert_eq!(to_fixed(-0.0004), 0);
        assert_eq!(to_fixed(-33.8675), -33868);
    }

    #[test]
    fn test_absent_is_single_nil() {
        let bytes = location_to_bytes(None);
        assert_eq!(bytes, vec![0xc0]);
        assert_eq!(location_from_bytes(&bytes).unwrap(), None);
    }

    #[test]
    fn test_nearby_locations_indistinguishable() {
        let a = location_from_bytes(&location_to_bytes(Some(&Location::new(35.681236, 139.767125))))
            .unwrap()
            .unwrap();
        let b = location_from_bytes(&location_to_bytes(Some(&Location::new(35.681237, 139.767126))))
            .unwrap()
            .unwrap();
        assert!((a.latitude - b.latitude).abs() < 1e-4);
        assert!((a.longitude - b.longitude).abs() < 1e-4);
        assert!((a.latitude - 35.681).abs() < 1e-4);
        assert!((a.longitude - 139.767).abs() < 1e-4);
    }

    #[test]
    fn test_single_element_rejected() {
        let bytes = [0x91, 0x00];
        assert!(matches!(
            location_from_bytes(&bytes),
            Err(DecodeError::ArrayTooShort {
                context: "location",
                len: 1,
                min: 2
            })
        ));
    }

    #[test]
    fn test_extra_elements_skipped() {
        let mut w = Writer::new();
        w.write_array_len(3);
        w.write_int(1000);
        w.write_int(-2000);
        w.write_str("altitude?");
        w.write_int(5);

        let mut reader = Reader::new(w.as_bytes());
        let loc = decode_location(&mut reader).unwrap().unwrap();
        assert_eq!(loc, Location::new(1.0, -2.0));
        assert_eq!(reader.read_i32("next").unwrap(), 5);
    }

    #[test]
    fn test_non_integer_component_rejected() {
        let mut w = Writer::new();
        w.write_array_len(2);
        w.write_f32(35.0);
        w.write_int(1);
        assert!(matches!(
            location_from_bytes(w.as_bytes()),
            Err(DecodeError::UnexpectedMarker {
                context: "latitude",
                ..
            })
        ));
    }

    proptest! {
        #[test]
        fn prop_roundtrip_within_half_step(lat in -90.0f32..=90.0, lng in -180.0f32..=180.0) {
            let decoded = location_from_bytes(&location_to_bytes(Some(&Location::new(lat, lng))))
                .unwrap()
                .unwrap();
            // f32 storage of the decoded value adds a little on top of the quantization error.
            let tolerance = MAX_ERROR_DEGREES + 1e-5;
            prop_assert!((decoded.latitude as f64 - lat as f64).abs() <= tolerance);
            prop_assert!((decoded.longitude as f64 - lng as f64).abs() <= tolerance);
        }
    }
}
