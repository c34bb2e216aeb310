//! Observation station records.
//!
//! [`StationRecord`] is the rich in-memory form built from the source data.
//! [`StationV1`] and [`StationV2`] are the two wire shapes derived from it.

use crate::model::{ImagePoint, Location, Point2};

/// The seismograph network a station belongs to.
///
/// The wire value is an open integer: values this crate does not know are
/// kept as [`StationType::Unrecognized`] so they round-trip unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StationType {
    /// Network not known. Avoid where possible.
    #[default]
    Unknown,
    /// KiK-net (borehole network).
    KiKNet,
    /// K-NET (surface network).
    KNet,
    /// A wire value outside the known set.
    Unrecognized(i32),
}

impl StationType {
    /// Creates a StationType from its wire representation.
    pub fn from_wire(v: i32) -> StationType {
        match v {
            0 => StationType::Unknown,
            1 => StationType::KiKNet,
            2 => StationType::KNet,
            other => StationType::Unrecognized(other),
        }
    }

    /// Returns the wire representation.
    pub fn to_wire(self) -> i32 {
        match self {
            StationType::Unknown => 0,
            StationType::KiKNet => 1,
            StationType::KNet => 2,
            StationType::Unrecognized(v) => v,
        }
    }

    /// Returns true for [`StationType::Unrecognized`].
    pub fn is_unrecognized(self) -> bool {
        matches!(self, StationType::Unrecognized(_))
    }
}

/// A station as described by the source data.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    pub code: String,
    pub station_type: StationType,
    pub name: String,
    pub region: String,
    pub is_suspended: bool,
    /// Location in the current (JGD2000) datum.
    pub location: Location,
    /// Location in the old Tokyo datum, where the source provides it.
    pub legacy_location: Option<Location>,
    pub image_point: Option<ImagePoint>,
}

impl StationRecord {
    /// Converts to the flat V1 export shape.
    ///
    /// The image point is flattened to its absolute pixel; the offset does
    /// not survive as a separate value. Classification IDs are not part of
    /// the source data and are left empty.
    pub fn to_v1(&self) -> StationV1 {
        StationV1 {
            station_type: self.station_type,
            code: self.code.clone(),
            name: self.name.clone(),
            region: self.region.clone(),
            is_suspended: self.is_suspended,
            location: self.location,
            point: self.image_point.map(|p| p.absolute()),
            classification_id: None,
            prefecture_classification_id: None,
            old_location: self.legacy_location,
        }
    }

    /// Converts to the compact V2 shape used by the container.
    pub fn to_v2(&self) -> StationV2 {
        StationV2 {
            code: self.code.clone(),
            station_type: self.station_type,
            name: self.name.clone(),
            region: self.region.clone(),
            is_suspended: self.is_suspended,
            location: self.location,
            image_point: self.image_point,
        }
    }
}

/// The flat, full-precision export shape read by older consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct StationV1 {
    pub station_type: StationType,
    pub code: String,
    pub name: String,
    pub region: String,
    pub is_suspended: bool,
    pub location: Location,
    /// Absolute pixel on the monitor image.
    pub point: Option<Point2>,
    /// Forecast area ID, used by one downstream importer only.
    pub classification_id: Option<i32>,
    /// Prefecture forecast area ID, used by one downstream importer only.
    pub prefecture_classification_id: Option<i32>,
    /// Location in the old Tokyo datum.
    pub old_location: Option<Location>,
}

/// The compact shape stored in KMOP containers.
#[derive(Debug, Clone, PartialEq)]
pub struct StationV2 {
    pub code: String,
    pub station_type: StationType,
    pub name: String,
    pub region: String,
    pub is_suspended: bool,
    pub location: Location,
    pub image_point: Option<ImagePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StationRecord {
        StationRecord {
            code: "IBRH01".to_string(),
            station_type: StationType::KiKNet,
            name: "Kitaibaraki".to_string(),
            region: "Ibaraki".to_string(),
            is_suspended: false,
            location: Location::new(36.794, 140.754),
            legacy_location: Some(Location::new(36.791, 140.757)),
            image_point: Some(ImagePoint::new(Point2::new(300, 200), Point2::new(-5, 3))),
        }
    }

    #[test]
    fn test_station_type_wire_roundtrip() {
        for v in [0, 1, 2, 3, -1, i32::MAX, i32::MIN] {
            assert_eq!(StationType::from_wire(v).to_wire(), v);
        }
        assert_eq!(StationType::from_wire(1), StationType::KiKNet);
        assert_eq!(StationType::from_wire(2), StationType::KNet);
        assert!(StationType::from_wire(7).is_unrecognized());
    }

    #[test]
    fn test_to_v1_flattens_image_point() {
        let v1 = sample().to_v1();
        assert_eq!(v1.station_type, StationType::KiKNet);
        assert_eq!(v1.point, Some(Point2::new(295, 203)));
        assert_eq!(v1.old_location, Some(Location::new(36.791, 140.757)));
        assert_eq!(v1.classification_id, None);
        assert_eq!(v1.prefecture_classification_id, None);
    }

    #[test]
    fn test_to_v2_keeps_offset() {
        let v2 = sample().to_v2();
        assert_eq!(v2.code, "IBRH01");
        assert_eq!(
            v2.image_point,
            Some(ImagePoint::new(Point2::new(300, 200), Point2::new(-5, 3)))
        );
    }

    #[test]
    fn test_to_v1_wraps_extreme_point() {
        let mut record = sample();
        record.image_point = Some(ImagePoint::new(Point2::new(i32::MAX, 0), Point2::new(1, 0)));
        assert_eq!(record.to_v1().point, Some(Point2::new(i32::MIN, 0)));
    }
}
