//! The hand-maintained station list the packer reads.
//!
//! The file is a JSON array of snake_case objects. `type` is written either
//! as a network name or as its integer wire value.

use anyhow::{Context, Result};
use serde::Deserialize;

use kmop::{ImagePoint, Location, Point2, StationRecord, StationType};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawType {
    Wire(i32),
    Name(String),
}

/// A station type as it appears in the source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawType")]
struct SourceType(StationType);

impl TryFrom<RawType> for SourceType {
    type Error = String;

    fn try_from(raw: RawType) -> Result<Self, Self::Error> {
        match raw {
            RawType::Wire(v) => Ok(SourceType(StationType::from_wire(v))),
            RawType::Name(name) => match name.to_ascii_lowercase().as_str() {
                "unknown" => Ok(SourceType(StationType::Unknown)),
                "kik_net" => Ok(SourceType(StationType::KiKNet)),
                "k_net" => Ok(SourceType(StationType::KNet)),
                _ => Err(format!("unknown station type {name:?}")),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct SourceLocation {
    latitude: f32,
    longitude: f32,
}

impl From<SourceLocation> for Location {
    fn from(l: SourceLocation) -> Self {
        Location::new(l.latitude, l.longitude)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct SourcePoint {
    x: i32,
    y: i32,
}

impl From<SourcePoint> for Point2 {
    fn from(p: SourcePoint) -> Self {
        Point2::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct SourceImagePoint {
    center_point: SourcePoint,
    offset: SourcePoint,
}

#[derive(Debug, Deserialize)]
struct SourceStation {
    #[serde(rename = "type", default)]
    station_type: SourceType,
    code: String,
    name: String,
    region: String,
    #[serde(default)]
    is_suspended: bool,
    location: SourceLocation,
    #[serde(default)]
    japanese_coordinate_system_location: Option<SourceLocation>,
    #[serde(default)]
    point: Option<SourceImagePoint>,
}

impl From<SourceStation> for StationRecord {
    fn from(s: SourceStation) -> Self {
        StationRecord {
            code: s.code,
            station_type: s.station_type.0,
            name: s.name,
            region: s.region,
            is_suspended: s.is_suspended,
            location: s.location.into(),
            legacy_location: s.japanese_coordinate_system_location.map(Into::into),
            image_point: s
                .point
                .map(|p| ImagePoint::new(p.center_point.into(), p.offset.into())),
        }
    }
}

/// Parses a source station list, keeping the file's order.
pub fn parse_stations(json: &[u8]) -> Result<Vec<StationRecord>> {
    let stations: Vec<SourceStation> =
        serde_json::from_slice(json).context("failed to parse station list")?;
    Ok(stations.into_iter().map(StationRecord::from).collect())
}
