//! Binary encoding/decoding for KMOP.
//!
//! Everything on the wire is MessagePack. Records are positional arrays
//! (see [`positional`]); locations and image points use the lossy compact
//! codecs in [`location`] and [`image_point`].

pub mod compression;
pub mod container;
pub mod image_point;
pub mod location;
pub mod lz4;
pub mod positional;
pub mod primitives;
pub mod station;

pub use compression::{transform_for, PayloadSink, PayloadTransform};
pub use container::{
    decode_container, decode_header, encode_header, encode_v2_container, read_container,
    read_header, write_container, Container,
};
pub use image_point::{
    decode_image_point, encode_image_point, image_point_from_bytes, image_point_to_bytes,
    pack_offset, unpack_offset,
};
pub use location::{decode_location, encode_location, location_from_bytes, location_to_bytes};
pub use primitives::{Reader, Writer};
pub use station::{decode_v1, encode_v1, encode_v1_lz4};
