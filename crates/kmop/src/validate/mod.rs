//! Semantic validation for station lists.
//!
//! The codecs check structure only: they never reject duplicate codes,
//! unknown station types or offsets that will wrap. This module reports
//! those conditions so a producer can decide what to do about them.
//!
//! **Note:** Validation is advisory. Nothing in [`crate::codec`] calls it,
//! and every station it flags still encodes.

use rustc_hash::FxHashSet;

use crate::error::ValidationError;
use crate::model::{Location, StationRecord};

fn check_location(
    code: &str,
    field: &'static str,
    location: &Location,
) -> Result<(), ValidationError> {
    if !location.is_valid() {
        return Err(ValidationError::InvalidCoordinate {
            code: code.to_string(),
            field,
            latitude: location.latitude,
            longitude: location.longitude,
        });
    }
    Ok(())
}

/// Returns every problem found in a single station.
///
/// Checks:
/// - the code is not empty
/// - the station type is one of the known networks
/// - both locations are finite and inside the WGS84 ranges
/// - the image point offset survives nibble packing unchanged
pub fn station_issues(station: &StationRecord) -> Vec<ValidationError> {
    let mut issues = Vec::new();
    let code = station.code.as_str();

    if code.is_empty() {
        issues.push(ValidationError::EmptyCode {
            name: station.name.clone(),
        });
    }
    if station.station_type.is_unrecognized() {
        issues.push(ValidationError::UnrecognizedType {
            code: code.to_string(),
            station_type: station.station_type,
        });
    }
    if let Err(e) = check_location(code, "location", &station.location) {
        issues.push(e);
    }
    if let Some(legacy) = &station.legacy_location {
        if let Err(e) = check_location(code, "legacy_location", legacy) {
            issues.push(e);
        }
    }
    if let Some(point) = &station.image_point {
        if !point.offset_in_range() {
            issues.push(ValidationError::OffsetOutOfRange {
                code: code.to_string(),
                offset: point.offset,
            });
        }
    }

    issues
}

/// Validates a single station, returning the first problem found.
pub fn validate_station(station: &StationRecord) -> Result<(), ValidationError> {
    match station_issues(station).into_iter().next() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Validates a station list: every per-station check plus code uniqueness.
///
/// Returns all problems in input order. Each duplicated code is reported
/// once per extra occurrence.
pub fn validate_stations(stations: &[StationRecord]) -> Vec<ValidationError> {
    let mut issues = Vec::new();
    let mut seen = FxHashSet::with_capacity_and_hasher(stations.len(), Default::default());

    for station in stations {
        issues.extend(station_issues(station));
        if !station.code.is_empty() && !seen.insert(station.code.as_str()) {
            issues.push(ValidationError::DuplicateCode {
                code: station.code.clone(),
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImagePoint, Point2, StationType};

    fn station(code: &str) -> StationRecord {
        StationRecord {
            code: code.to_string(),
            station_type: StationType::KNet,
            name: "Station".to_string(),
            region: "Region".to_string(),
            is_suspended: false,
            location: Location::new(35.0, 135.0),
            legacy_location: None,
            image_point: Some(ImagePoint::new(Point2::new(10, 10), Point2::new(0, 0))),
        }
    }

    #[test]
    fn test_valid_station() {
        assert!(validate_station(&station("OSK001")).is_ok());
        assert!(validate_stations(&[station("OSK001"), station("OSK002")]).is_empty());
    }

    #[test]
    fn test_duplicate_code() {
        let issues = validate_stations(&[station("OSK001"), station("OSK002"), station("OSK001")]);
        assert_eq!(
            issues,
            vec![ValidationError::DuplicateCode {
                code: "OSK001".to_string()
            }]
        );
    }

    #[test]
    fn test_offset_out_of_range() {
        let mut s = station("OSK001");
        s.image_point = Some(ImagePoint::new(Point2::new(10, 10), Point2::new(10, 0)));
        assert!(matches!(
            validate_station(&s),
            Err(ValidationError::OffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn test_unrecognized_type() {
        let mut s = station("OSK001");
        s.station_type = StationType::Unrecognized(9);
        assert!(matches!(
            validate_station(&s),
            Err(ValidationError::UnrecognizedType { .. })
        ));
    }

    #[test]
    fn test_invalid_coordinates() {
        let mut s = station("OSK001");
        s.location = Location::new(f32::NAN, 135.0);
        s.legacy_location = Some(Location::new(35.0, 181.0));
        let issues = station_issues(&s);
        assert_eq!(issues.len(), 2);
        assert!(matches!(
            &issues[1],
            ValidationError::InvalidCoordinate {
                field: "legacy_location",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_code_not_counted_as_duplicate() {
        let issues = validate_stations(&[station(""), station("")]);
        assert_eq!(issues.len(), 2);
        assert!(issues
            .iter()
            .all(|e| matches!(e, ValidationError::EmptyCode { .. })));
    }
}
