//! Station record schemas.
//!
//! V2 is the compact shape stored in containers: fixed-point location and
//! nibble-packed image point. V1 is the older flat export shape: full
//! precision float locations, a plain absolute point, and two importer-only
//! classification IDs. V1 is written for legacy consumers; nothing in this
//! crate converts V1 back into V2.

use crate::codec::image_point::{decode_image_point, decode_point, encode_image_point, encode_point};
use crate::codec::location::{decode_location, encode_location};
use crate::codec::lz4;
use crate::codec::positional::{FieldSpec, RecordLayout};
use crate::codec::primitives::{Reader, Writer, check_len, marker};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAX_STATIONS, MAX_STRING_LEN};
use crate::model::{Location, StationType, StationV1, StationV2};

pub const STATION_V1_LAYOUT: RecordLayout = RecordLayout {
    name: "station_v1",
    fields: &[
        FieldSpec::required(0, "type"),
        FieldSpec::required(1, "code"),
        FieldSpec::required(2, "name"),
        FieldSpec::required(3, "region"),
        FieldSpec::required(4, "is_suspended"),
        FieldSpec::required(5, "location"),
        FieldSpec::optional(6, "point"),
        FieldSpec::optional(7, "classification_id"),
        FieldSpec::optional(8, "prefecture_classification_id"),
        FieldSpec::optional(9, "old_location"),
    ],
};

pub const STATION_V2_LAYOUT: RecordLayout = RecordLayout {
    name: "station_v2",
    fields: &[
        FieldSpec::required(0, "code"),
        FieldSpec::required(1, "type"),
        FieldSpec::required(2, "name"),
        FieldSpec::required(3, "region"),
        FieldSpec::required(4, "is_suspended"),
        FieldSpec::required(5, "location"),
        FieldSpec::optional(6, "image_point"),
    ],
};

/// Full-precision `[latitude, longitude]` pair used by V1.
const FLOAT_LOCATION_LAYOUT: RecordLayout = RecordLayout {
    name: "float_location",
    fields: &[
        FieldSpec::required(0, "latitude"),
        FieldSpec::required(1, "longitude"),
    ],
};

fn check_strings(code: &str, name: &str, region: &str) -> Result<(), EncodeError> {
    check_len("code", code.len(), MAX_STRING_LEN)?;
    check_len("name", name.len(), MAX_STRING_LEN)?;
    check_len("region", region.len(), MAX_STRING_LEN)
}

fn check_station_count(len: usize) -> Result<(), EncodeError> {
    check_len("stations", len, MAX_STATIONS)
}

fn encode_float_location(writer: &mut Writer, location: &Location) {
    FLOAT_LOCATION_LAYOUT.write_header(writer);
    writer.write_f32(location.latitude);
    writer.write_f32(location.longitude);
}

fn decode_float_location(reader: &mut Reader<'_>) -> Result<Location, DecodeError> {
    let mut rec = FLOAT_LOCATION_LAYOUT.read(reader)?;
    let latitude = rec.field(|r, name| r.read_f32(name))?;
    let longitude = rec.field(|r, name| r.read_f32(name))?;
    rec.finish()?;
    Ok(Location::new(latitude, longitude))
}

fn write_optional_i32(writer: &mut Writer, value: Option<i32>) {
    match value {
        Some(v) => writer.write_int(v as i64),
        None => writer.write_nil(),
    }
}

// =============================================================================
// V2
// =============================================================================

/// Encodes one V2 station.
pub fn encode_station_v2(writer: &mut Writer, station: &StationV2) -> Result<(), EncodeError> {
    check_strings(&station.code, &station.name, &station.region)?;

    STATION_V2_LAYOUT.write_header(writer);
    writer.write_str(&station.code);
    writer.write_int(station.station_type.to_wire() as i64);
    writer.write_str(&station.name);
    writer.write_str(&station.region);
    writer.write_bool(station.is_suspended);
    encode_location(writer, Some(&station.location));
    encode_image_point(writer, station.image_point.as_ref());
    Ok(())
}

/// Decodes one V2 station. A nil location is rejected.
pub fn decode_station_v2(reader: &mut Reader<'_>) -> Result<StationV2, DecodeError> {
    let mut rec = STATION_V2_LAYOUT.read(reader)?;
    let code = rec.field(|r, name| r.read_string(MAX_STRING_LEN, name))?;
    let station_type = StationType::from_wire(rec.field(|r, name| r.read_i32(name))?);
    let name = rec.field(|r, name| r.read_string(MAX_STRING_LEN, name))?;
    let region = rec.field(|r, name| r.read_string(MAX_STRING_LEN, name))?;
    let is_suspended = rec.field(|r, name| r.read_bool(name))?;
    let location = rec.field(|r, name| {
        decode_location(r)?.ok_or(DecodeError::UnexpectedMarker {
            context: name,
            marker: marker::NIL,
        })
    })?;
    let image_point = rec.optional(|r, _| decode_image_point(r))?.flatten();
    rec.finish()?;

    Ok(StationV2 {
        code,
        station_type,
        name,
        region,
        is_suspended,
        location,
        image_point,
    })
}

/// Encodes a V2 station array.
pub fn encode_stations_v2(writer: &mut Writer, stations: &[StationV2]) -> Result<(), EncodeError> {
    check_station_count(stations.len())?;
    writer.write_array_len(stations.len());
    for station in stations {
        encode_station_v2(writer, station)?;
    }
    Ok(())
}

/// Decodes a V2 station array. Failures carry the record index.
pub fn decode_stations_v2(reader: &mut Reader<'_>) -> Result<Vec<StationV2>, DecodeError> {
    let count = reader.read_array_len(MAX_STATIONS, "stations")?;
    let mut stations = Vec::with_capacity(count.min(reader.remaining_len()));
    for index in 0..count {
        stations.push(decode_station_v2(reader).map_err(|e| e.in_record(index))?);
    }
    Ok(stations)
}

// =============================================================================
// V1
// =============================================================================

/// Encodes one V1 station.
pub fn encode_station_v1(writer: &mut Writer, station: &StationV1) -> Result<(), EncodeError> {
    check_strings(&station.code, &station.name, &station.region)?;

    STATION_V1_LAYOUT.write_header(writer);
    writer.write_int(station.station_type.to_wire() as i64);
    writer.write_str(&station.code);
    writer.write_str(&station.name);
    writer.write_str(&station.region);
    writer.write_bool(station.is_suspended);
    encode_float_location(writer, &station.location);
    match station.point {
        Some(point) => encode_point(writer, point),
        None => writer.write_nil(),
    }
    write_optional_i32(writer, station.classification_id);
    write_optional_i32(writer, station.prefecture_classification_id);
    match &station.old_location {
        Some(location) => encode_float_location(writer, location),
        None => writer.write_nil(),
    }
    Ok(())
}

/// Decodes one V1 station.
pub fn decode_station_v1(reader: &mut Reader<'_>) -> Result<StationV1, DecodeError> {
    let mut rec = STATION_V1_LAYOUT.read(reader)?;
    let station_type = StationType::from_wire(rec.field(|r, name| r.read_i32(name))?);
    let code = rec.field(|r, name| r.read_string(MAX_STRING_LEN, name))?;
    let name = rec.field(|r, name| r.read_string(MAX_STRING_LEN, name))?;
    let region = rec.field(|r, name| r.read_string(MAX_STRING_LEN, name))?;
    let is_suspended = rec.field(|r, name| r.read_bool(name))?;
    let location = rec.field(|r, _| decode_float_location(r))?;
    let point = rec.optional(|r, _| decode_point(r))?;
    let classification_id = rec.optional(|r, name| r.read_i32(name))?;
    let prefecture_classification_id = rec.optional(|r, name| r.read_i32(name))?;
    let old_location = rec.optional(|r, _| decode_float_location(r))?;
    rec.finish()?;

    Ok(StationV1 {
        station_type,
        code,
        name,
        region,
        is_suspended,
        location,
        point,
        classification_id,
        prefecture_classification_id,
        old_location,
    })
}

/// Encodes stations as a plain MessagePack array of V1 records.
pub fn encode_v1(stations: &[StationV1]) -> Result<Vec<u8>, EncodeError> {
    check_station_count(stations.len())?;
    let mut writer = Writer::with_capacity(stations.len() * 64 + 8);
    writer.write_array_len(stations.len());
    for station in stations {
        encode_station_v1(&mut writer, station)?;
    }
    Ok(writer.into_bytes())
}

/// Encodes stations as V1 records inside the single-block LZ4 envelope.
pub fn encode_v1_lz4(stations: &[StationV1]) -> Result<Vec<u8>, EncodeError> {
    Ok(lz4::compress_block(&encode_v1(stations)?))
}

/// Decodes output of [`encode_v1`] or [`encode_v1_lz4`].
pub fn decode_v1(bytes: &[u8]) -> Result<Vec<StationV1>, DecodeError> {
    let payload = lz4::decompress(bytes).map_err(DecodeError::in_payload)?;
    let mut reader = Reader::new(&payload);
    let count = reader
        .read_array_len(MAX_STATIONS, "stations")
        .map_err(DecodeError::in_payload)?;
    let mut stations = Vec::with_capacity(count.min(reader.remaining_len()));
    for index in 0..count {
        let station = decode_station_v1(&mut reader).map_err(|e| e.in_record(index).in_payload())?;
        stations.push(station);
    }
    Ok(stations)
}
