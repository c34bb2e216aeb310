//! Pixel coordinates on the reference monitor image.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// An integer pixel coordinate or offset.
///
/// Arithmetic is componentwise; the scalar forms apply the same integer to
/// both axes. Division truncates toward zero and panics on a zero divisor,
/// like `i32` division.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point2 {
    pub x: i32,
    pub y: i32,
}

impl Point2 {
    /// Creates a point from its two components.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{} Y:{}", self.x, self.y)
    }
}

/// Arithmetic wraps on overflow.
macro_rules! impl_point_op {
    ($trait:ident, $method:ident, $op:ident) => {
        impl $trait for Point2 {
            type Output = Point2;

            fn $method(self, rhs: Point2) -> Point2 {
                Point2::new(self.x.$op(rhs.x), self.y.$op(rhs.y))
            }
        }

        impl $trait<i32> for Point2 {
            type Output = Point2;

            fn $method(self, rhs: i32) -> Point2 {
                Point2::new(self.x.$op(rhs), self.y.$op(rhs))
            }
        }
    };
}

impl_point_op!(Add, add, wrapping_add);
impl_point_op!(Sub, sub, wrapping_sub);
impl_point_op!(Mul, mul, wrapping_mul);
impl_point_op!(Div, div, wrapping_div);

/// A station's position on the monitor image.
///
/// `center` is the pixel anchor; `offset` is a small correction whose
/// components are meant to lie in `[-8, 7]`. The wire codec packs the
/// offset into 4 bits per axis and wraps anything outside that range
/// rather than rejecting it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ImagePoint {
    pub center: Point2,
    pub offset: Point2,
}

impl ImagePoint {
    /// Smallest offset component the packed form represents exactly.
    pub const OFFSET_MIN: i32 = -8;
    /// Largest offset component the packed form represents exactly.
    pub const OFFSET_MAX: i32 = 7;

    pub const fn new(center: Point2, offset: Point2) -> Self {
        Self { center, offset }
    }

    /// The absolute pixel this point refers to (`center + offset`).
    pub fn absolute(&self) -> Point2 {
        self.center + self.offset
    }

    /// Returns true if both offset components survive packing unchanged.
    pub fn offset_in_range(&self) -> bool {
        let range = Self::OFFSET_MIN..=Self::OFFSET_MAX;
        range.contains(&self.offset.x) && range.contains(&self.offset.y)
    }
}
