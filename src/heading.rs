use nalgebra::Vector3;

#[allow(unused_imports)]
use num_traits::Float as _;

/// Heading in degrees, in `[0, 360)`, from the horizontal field components.
/// Assumes the sensor is held level, there is no tilt compensation.
pub fn heading_degrees(x: f32, y: f32) -> f32 {
    // atan2 lies in [-180, 180], so the sum is always positive
    (360.0 - x.atan2(y).to_degrees() + 360.0) % 360.0
}

/// [`heading_degrees`] of a corrected field vector.
pub fn heading_of(mag: &Vector3<f32>) -> f32 {
    heading_degrees(mag.x, mag.y)
}
