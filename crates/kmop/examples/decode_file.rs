//! Simple decoder to inspect KMOP and V1 station files.

use std::collections::BTreeMap;
use std::fs;

use kmop::{decode_container, decode_v1, read_header, StationType, StationV2};

fn format_type(t: StationType) -> String {
    match t {
        StationType::Unknown => "Unknown".to_string(),
        StationType::KiKNet => "KiK-net".to_string(),
        StationType::KNet => "K-NET".to_string(),
        StationType::Unrecognized(v) => format!("UNRECOGNIZED({})", v),
    }
}

fn format_station(s: &StationV2) -> String {
    let point = match &s.image_point {
        Some(p) => format!("({}) offset ({})", p.center, p.offset),
        None => "-".to_string(),
    };
    format!(
        "{:<8} {:<8} {}{} [{}] {:.3},{:.3} {}",
        s.code,
        format_type(s.station_type),
        s.name,
        if s.is_suspended { " (suspended)" } else { "" },
        s.region,
        s.location.latitude,
        s.location.longitude,
        point
    )
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "intensity-points-v2.kmop".to_string());

    println!("Reading: {}", path);

    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    if path.ends_with(".mpk") || path.ends_with(".mpk.lz4") {
        let stations = decode_v1(&data).expect("Failed to decode");
        println!("\n=== V1 Stations ({}) ===", stations.len());
        for s in stations.iter().take(20) {
            println!("  {:<8} {} [{}] {}", s.code, s.name, s.region, s.location);
        }
        return;
    }

    let header = read_header(&data).expect("Failed to decode header");
    println!("\n=== Header ===");
    println!("Version: {}", header.version);
    println!("Data version: {}", header.data_version);
    println!("Packed at: {}", header.packed_at);
    println!("Source: {}", header.source);
    println!("Compression: {:?}", header.compression_mode);

    let container = decode_container(&data).expect("Failed to decode");
    let stations = &container.stations;
    println!("\n=== Stations ({}) ===", stations.len());

    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    let mut suspended = 0;
    let mut without_point = 0;
    for s in stations {
        *by_type.entry(format_type(s.station_type)).or_default() += 1;
        if s.is_suspended {
            suspended += 1;
        }
        if s.image_point.is_none() {
            without_point += 1;
        }
    }
    for (t, count) in &by_type {
        println!("  {}: {}", t, count);
    }
    println!("  Suspended: {}", suspended);
    println!("  Without image point: {}", without_point);

    println!("\n=== First 20 Stations (detail) ===");
    for (i, s) in stations.iter().take(20).enumerate() {
        println!("[{}] {}", i, format_station(s));
    }
}
