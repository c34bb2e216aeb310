//! End-to-end tests through the public API.

use proptest::prelude::*;

use kmop::codec::location::{encode_location, from_fixed};
use kmop::codec::Writer;
use kmop::limits::{FORMAT_VERSION, MAGIC};
use kmop::{
    decode_container, decode_v1, encode_v1, encode_v1_lz4, encode_v2_container, read_container,
    read_header, CompressionMode, ContainerHeader, DecodeError, ErrorKind, ImagePoint, Location,
    Point2, StationRecord, StationType, StationV2, Timestamp,
};

const SOURCE: &str = "https://github.com/ingen084/kyoshin-monitor-observation-points";

fn header(mode: CompressionMode) -> ContainerHeader {
    ContainerHeader::new("v1.2.3", Timestamp::new(1_700_000_000, 250_000_000), SOURCE, mode)
}

fn record(i: usize) -> StationRecord {
    StationRecord {
        code: format!("STN{:03}", i),
        station_type: if i % 2 == 0 {
            StationType::KNet
        } else {
            StationType::KiKNet
        },
        name: format!("観測点{}", i),
        region: "宮城県".to_string(),
        is_suspended: i % 7 == 0,
        location: Location::new(38.25 + i as f32 * 0.01, 140.875),
        legacy_location: Some(Location::new(38.25, 140.875)),
        image_point: (i % 3 != 0).then(|| {
            ImagePoint::new(Point2::new(100 + i as i32, 200), Point2::new(-3, 4))
        }),
    }
}

/// Writes the prelude of a container by hand, with `extra` appended to
/// the header as an additional trailing field.
fn handwritten_prelude(version: u64, extra: Option<&str>) -> Writer {
    let mut w = Writer::new();
    w.write_bytes(MAGIC);
    w.write_array_len(if extra.is_some() { 6 } else { 5 });
    w.write_uint(version);
    w.write_str("v9");
    w.write_timestamp(Timestamp::new(1_700_000_000, 0));
    w.write_str(SOURCE);
    w.write_uint(0);
    if let Some(extra) = extra {
        w.write_str(extra);
    }
    w
}

#[test]
fn test_every_mode_round_trips() {
    let stations: Vec<StationV2> = (0..50).map(|i| record(i).to_v2()).collect();
    for mode in CompressionMode::ALL {
        let header = header(mode);
        let bytes = encode_v2_container(&stations, &header).unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(read_header(&bytes).unwrap(), header);

        let container = decode_container(&bytes).unwrap();
        assert_eq!(container.header, header);
        assert_eq!(container.stations.len(), stations.len());
        for (got, want) in container.stations.iter().zip(&stations) {
            assert_eq!(got.code, want.code);
            assert_eq!(got.station_type, want.station_type);
            assert_eq!(got.image_point, want.image_point);
            assert!((got.location.latitude - want.location.latitude).abs() <= 0.0006);
            assert!((got.location.longitude - want.location.longitude).abs() <= 0.0006);
        }

        let streamed = read_container(&mut bytes.as_slice()).unwrap();
        assert_eq!(streamed, container, "{:?}", mode);
    }
}

#[test]
fn test_compressed_modes_shrink_repetitive_payload() {
    let stations: Vec<StationV2> = (0..500).map(|i| record(i).to_v2()).collect();
    let plain = encode_v2_container(&stations, &header(CompressionMode::None)).unwrap();
    for mode in [
        CompressionMode::Lz4BlockArray,
        CompressionMode::GZip,
        CompressionMode::Brotli,
    ] {
        let packed = encode_v2_container(&stations, &header(mode)).unwrap();
        assert!(packed.len() < plain.len(), "{:?}", mode);
    }
}

#[test]
fn test_empty_station_list() {
    for mode in CompressionMode::ALL {
        let bytes = encode_v2_container(&[], &header(mode)).unwrap();
        assert!(decode_container(&bytes).unwrap().stations.is_empty());
    }
}

#[test]
fn test_magic_mismatch() {
    let mut bytes = encode_v2_container(&[record(1).to_v2()], &header(CompressionMode::None)).unwrap();
    bytes[3] = b'X';
    let err = decode_container(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(matches!(err.root(), DecodeError::InvalidMagic { .. }));
}

#[test]
fn test_unsupported_version() {
    let mut w = handwritten_prelude(FORMAT_VERSION as u64 + 1, None);
    w.write_array_len(0);
    let bytes = w.into_bytes();

    let err = read_header(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
    assert!(matches!(
        err.root(),
        DecodeError::UnsupportedVersion { version } if *version == FORMAT_VERSION as i128 + 1
    ));
    assert_eq!(
        decode_container(&bytes).unwrap_err().kind(),
        ErrorKind::UnsupportedVersion
    );
}

#[test]
fn test_unknown_trailing_fields_are_skipped() {
    let mut w = handwritten_prelude(FORMAT_VERSION as u64, Some("added later"));
    w.write_array_len(1);
    w.write_array_len(8);
    w.write_str("MYG004");
    w.write_int(2);
    w.write_str("築館");
    w.write_str("宮城県北部");
    w.write_bool(true);
    encode_location(&mut w, Some(&Location::new(38.729, 141.021)));
    w.write_nil();
    w.write_array_len(2);
    w.write_uint(1);
    w.write_str("nested");
    let bytes = w.into_bytes();

    let container = decode_container(&bytes).unwrap();
    assert_eq!(container.header.data_version, "v9");
    assert_eq!(container.stations.len(), 1);
    let station = &container.stations[0];
    assert_eq!(station.code, "MYG004");
    assert_eq!(station.station_type, StationType::KNet);
    assert!(station.is_suspended);
    assert_eq!(station.image_point, None);
    assert_eq!(station.location, Location::new(from_fixed(38729), from_fixed(141021)));
}

#[test]
fn test_unrecognized_station_type_survives() {
    let mut station = record(4).to_v2();
    station.station_type = StationType::Unrecognized(42);
    let bytes = encode_v2_container(&[station], &header(CompressionMode::GZip)).unwrap();
    let container = decode_container(&bytes).unwrap();
    assert_eq!(container.stations[0].station_type, StationType::Unrecognized(42));
}

#[test]
fn test_v1_exports_round_trip() {
    let stations: Vec<_> = (0..120).map(|i| record(i).to_v1()).collect();
    let plain = encode_v1(&stations).unwrap();
    let packed = encode_v1_lz4(&stations).unwrap();
    assert_ne!(plain, packed);

    assert_eq!(decode_v1(&plain).unwrap(), stations);
    assert_eq!(decode_v1(&packed).unwrap(), stations);
}

#[test]
fn test_v1_flattens_image_point() {
    let v1 = record(1).to_v1();
    assert_eq!(v1.point, Some(Point2::new(98, 204)));
    assert_eq!(v1.old_location, Some(Location::new(38.25, 140.875)));
    assert_eq!(v1.station_type, StationType::KiKNet);
}

fn arb_station() -> impl Strategy<Value = StationV2> {
    (
        "[A-Z]{3}[0-9]{3}",
        0i32..4,
        "\\PC{0,12}",
        "\\PC{0,12}",
        any::<bool>(),
        (-90_000i32..=90_000, -180_000i32..=180_000),
        proptest::option::of(((-2000i32..2000, -2000i32..2000), (-8i32..8, -8i32..8))),
    )
        .prop_map(|(code, ty, name, region, is_suspended, (lat, lng), point)| StationV2 {
            code,
            station_type: StationType::from_wire(ty),
            name,
            region,
            is_suspended,
            location: Location::new(from_fixed(lat), from_fixed(lng)),
            image_point: point.map(|((cx, cy), (ox, oy))| {
                ImagePoint::new(Point2::new(cx, cy), Point2::new(ox, oy))
            }),
        })
}

fn arb_mode() -> impl Strategy<Value = CompressionMode> {
    prop::sample::select(CompressionMode::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_container_round_trip(
        stations in prop::collection::vec(arb_station(), 0..40),
        mode in arb_mode(),
        seconds in 0i64..4_000_000_000,
        nanos in 0u32..1_000_000_000,
        data_version in "[a-z0-9.]{0,16}",
    ) {
        let header = ContainerHeader::new(data_version, Timestamp::new(seconds, nanos), SOURCE, mode);
        let bytes = encode_v2_container(&stations, &header).unwrap();
        let container = decode_container(&bytes).unwrap();
        prop_assert_eq!(container.header, header);
        prop_assert_eq!(container.stations, stations);
    }

    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut input = MAGIC.to_vec();
        input.extend_from_slice(&bytes);
        let _ = decode_container(&input);
        let _ = decode_v1(&bytes);
    }
}
