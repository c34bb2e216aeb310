//! Container header types.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::limits::FORMAT_VERSION;
use crate::util::datetime::{format_timestamp_rfc3339, parse_timestamp_rfc3339, DateTimeParseError};

/// A UTC instant with nanosecond resolution.
///
/// `nanos` is always below 1_000_000_000; instants before the epoch have a
/// negative `seconds` and a non-negative `nanos`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub const UNIX_EPOCH: Timestamp = Timestamp {
        seconds: 0,
        nanos: 0,
    };

    /// Creates a timestamp, normalizing `nanos` into `seconds`.
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self {
            seconds: seconds + (nanos / 1_000_000_000) as i64,
            nanos: nanos % 1_000_000_000,
        }
    }

    /// The current system time.
    pub fn now() -> Self {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => Self::new(d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                // Clock before 1970: mirror the duration below the epoch.
                let d = e.duration();
                if d.subsec_nanos() == 0 {
                    Self::new(-(d.as_secs() as i64), 0)
                } else {
                    Self::new(-(d.as_secs() as i64) - 1, 1_000_000_000 - d.subsec_nanos())
                }
            }
        }
    }

    /// Parses an RFC 3339 datetime, converting any offset to UTC.
    pub fn parse_rfc3339(s: &str) -> Result<Self, DateTimeParseError> {
        let (seconds, nanos) = parse_timestamp_rfc3339(s)?;
        Ok(Self { seconds, nanos })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_timestamp_rfc3339(self.seconds, self.nanos))
    }
}

/// How the station payload is compressed.
///
/// Chosen once per file and recorded in the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompressionMode {
    /// Raw MessagePack.
    #[default]
    None = 0,
    /// LZ4 blocks in the MessagePack block-array envelope.
    Lz4BlockArray = 1,
    /// Streaming gzip.
    GZip = 2,
    /// Streaming brotli.
    Brotli = 3,
}

impl CompressionMode {
    /// All modes, in wire order.
    pub const ALL: [CompressionMode; 4] = [
        CompressionMode::None,
        CompressionMode::Lz4BlockArray,
        CompressionMode::GZip,
        CompressionMode::Brotli,
    ];

    /// Creates a CompressionMode from its wire representation.
    pub fn from_wire(v: i64) -> Option<CompressionMode> {
        match v {
            0 => Some(CompressionMode::None),
            1 => Some(CompressionMode::Lz4BlockArray),
            2 => Some(CompressionMode::GZip),
            3 => Some(CompressionMode::Brotli),
            _ => None,
        }
    }

    /// Returns the wire representation.
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

/// Metadata written uncompressed ahead of the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Container format version. Only [`FORMAT_VERSION`] is readable.
    pub version: u32,
    /// Caller-defined version of the station data set.
    pub data_version: String,
    pub packed_at: Timestamp,
    /// Provenance of the data, usually a URL.
    pub source: String,
    pub compression_mode: CompressionMode,
}

impl ContainerHeader {
    /// Creates a header for the current format version.
    pub fn new(
        data_version: impl Into<String>,
        packed_at: Timestamp,
        source: impl Into<String>,
        compression_mode: CompressionMode,
    ) -> Self {
        Self {
            version: FORMAT_VERSION,
            data_version: data_version.into(),
            packed_at,
            source: source.into(),
            compression_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_normalizes_nanos() {
        let ts = Timestamp::new(10, 2_500_000_000);
        assert_eq!(ts, Timestamp { seconds: 12, nanos: 500_000_000 });
    }

    #[test]
    fn test_timestamp_display_and_parse() {
        let ts = Timestamp::new(1_700_000_000, 123_000_000);
        let s = ts.to_string();
        assert_eq!(s, "2023-11-14T22:13:20.123Z");
        assert_eq!(Timestamp::parse_rfc3339(&s).unwrap(), ts);
    }

    #[test]
    fn test_now_is_after_2020() {
        assert!(Timestamp::now().seconds > 1_577_836_800);
    }

    #[test]
    fn test_compression_mode_wire() {
        for mode in CompressionMode::ALL {
            assert_eq!(CompressionMode::from_wire(mode.to_wire() as i64), Some(mode));
        }
        assert_eq!(CompressionMode::from_wire(4), None);
        assert_eq!(CompressionMode::from_wire(-1), None);
    }
}
