//! Horizontal point type for source geometry.

use nalgebra::Vector2;

/// Point in the horizontal plane.
///
/// This is a simple alias for `nalgebra::Vector2<f64>`: `x` is the
/// north-south coordinate and `y` the west-east coordinate, both in metres.
pub type GroundPoint = Vector2<f64>;
