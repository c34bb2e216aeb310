//! Utility modules for KMOP.

pub mod datetime;

pub use datetime::{format_timestamp_rfc3339, parse_timestamp_rfc3339, DateTimeParseError};
