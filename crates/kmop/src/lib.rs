//! KMOP: compact container format for seismic observation station metadata.
//!
//! This crate provides encoding, decoding, and validation for the station
//! files distributed to intensity-monitor clients.
//!
//! # Overview
//!
//! A station list is written in two shapes:
//! - **V2** (`.kmop`): the canonical compact shape inside a versioned
//!   container, with fixed-point locations and nibble-packed image offsets
//! - **V1** (`.mpk`, `.mpk.lz4`): the older flat shape with full-precision
//!   floats, kept for consumers that predate V2
//!
//! # Quick Start
//!
//! ```rust
//! use kmop::{CompressionMode, ContainerHeader, Location, StationType, StationV2, Timestamp};
//! use kmop::codec::{decode_container, encode_v2_container};
//!
//! let stations = vec![StationV2 {
//!     code: "IBRH01".to_string(),
//!     station_type: StationType::KiKNet,
//!     name: "Kitaibaraki".to_string(),
//!     region: "Ibaraki".to_string(),
//!     is_suspended: false,
//!     location: Location::new(36.794, 140.754),
//!     image_point: None,
//! }];
//! let header = ContainerHeader::new(
//!     "20240101",
//!     Timestamp::now(),
//!     "https://github.com/ingen084/kyoshin-monitor-observation-points",
//!     CompressionMode::Lz4BlockArray,
//! );
//!
//! let bytes = encode_v2_container(&stations, &header).unwrap();
//! let container = decode_container(&bytes).unwrap();
//! assert_eq!(container.header, header);
//! assert_eq!(container.stations[0].code, "IBRH01");
//! ```
//!
//! # Modules
//!
//! - [`model`]: Value types (Point2, Location, ImagePoint, stations, header)
//! - [`codec`]: MessagePack encoding/decoding, compression and the container
//! - [`validate`]: Advisory semantic validation
//! - [`error`]: Error types
//! - [`limits`]: Format constants and security limits for decoding
//!
//! # Precision
//!
//! V2 locations are rounded to 0.001°, so a round trip may move a
//! coordinate by up to 0.0005° on each axis. Image offsets outside [-8, 7]
//! wrap. Neither is reported as an error; use [`validate`] to catch offsets
//! before encoding.
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - Every length read from the wire is checked against [`limits`] before
//!   allocating
//! - Decompressed payloads are bounded
//! - Skipping unknown values is depth-limited

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod util;
pub mod validate;

// Re-export commonly used types at crate root
pub use codec::{
    decode_container, decode_v1, encode_v1, encode_v1_lz4, encode_v2_container, read_container,
    read_header, write_container, Container,
};
pub use error::{DecodeError, EncodeError, ErrorKind, ValidationError};
pub use model::{
    CompressionMode, ContainerHeader, ImagePoint, Location, Point2, StationRecord, StationType,
    StationV1, StationV2, Timestamp,
};
pub use validate::{station_issues, validate_station, validate_stations};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
