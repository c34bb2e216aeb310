//! Data model types for KMOP.
//!
//! This module contains the value types the codecs operate on:
//! - Points (pixel coordinates and offsets)
//! - Locations (geographic coordinates)
//! - Stations (the rich record and its V1/V2 wire shapes)
//! - Container headers

pub mod header;
pub mod location;
pub mod point;
pub mod station;

pub use header::{CompressionMode, ContainerHeader, Timestamp};
pub use location::Location;
pub use point::{ImagePoint, Point2};
pub use station::{StationRecord, StationType, StationV1, StationV2};
