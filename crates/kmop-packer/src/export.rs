//! Text exports of the V1 station list.

use serde::Serialize;

use kmop::{Location, Point2, StationV1};

#[derive(Serialize)]
struct JsonLocation {
    latitude: f32,
    longitude: f32,
}

impl From<Location> for JsonLocation {
    fn from(l: Location) -> Self {
        Self {
            latitude: l.latitude,
            longitude: l.longitude,
        }
    }
}

#[derive(Serialize)]
struct JsonPoint {
    x: i32,
    y: i32,
}

impl From<Point2> for JsonPoint {
    fn from(p: Point2) -> Self {
        Self { x: p.x, y: p.y }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct JsonStation<'a> {
    #[serde(rename = "Type")]
    station_type: i32,
    code: &'a str,
    name: &'a str,
    region: &'a str,
    is_suspended: bool,
    location: JsonLocation,
    old_location: Option<JsonLocation>,
    point: Option<JsonPoint>,
    classification_id: Option<i32>,
    prefecture_classification_id: Option<i32>,
}

impl<'a> From<&'a StationV1> for JsonStation<'a> {
    fn from(s: &'a StationV1) -> Self {
        Self {
            station_type: s.station_type.to_wire(),
            code: &s.code,
            name: &s.name,
            region: &s.region,
            is_suspended: s.is_suspended,
            location: s.location.into(),
            old_location: s.old_location.map(Into::into),
            point: s.point.map(Into::into),
            classification_id: s.classification_id,
            prefecture_classification_id: s.prefecture_classification_id,
        }
    }
}

/// Renders the V1 list as a compact JSON array with PascalCase keys.
pub fn to_json(stations: &[StationV1]) -> serde_json::Result<String> {
    let rows: Vec<JsonStation<'_>> = stations.iter().map(JsonStation::from).collect();
    serde_json::to_string(&rows)
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_bool(v: bool) -> &'static str {
    if v { "True" } else { "False" }
}

fn csv_line(s: &StationV1) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
        s.station_type.to_wire(),
        s.code,
        csv_bool(s.is_suspended),
        s.name,
        s.region,
        s.location.latitude,
        s.location.longitude,
        opt(s.point.map(|p| p.x)),
        opt(s.point.map(|p| p.y)),
        opt(s.classification_id),
        opt(s.prefecture_classification_id),
        opt(s.old_location.map(|l| l.latitude)),
        opt(s.old_location.map(|l| l.longitude)),
    )
}

/// Renders the V1 list as headerless CSV, one station per line.
///
/// Columns: type, code, suspended, name, region, latitude, longitude,
/// x, y, classification id, prefecture classification id, old latitude,
/// old longitude. Absent values are empty. Fields are not quoted.
pub fn to_csv(stations: &[StationV1]) -> String {
    stations.iter().map(csv_line).collect()
}
