use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Uncorrected magnetometer sample, in raw sensor units.
///
/// The sensor reports signed 16-bit values, which are widened to `i32` so an
/// offset can be added without overflow.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMagSample {
    pub mag: Vector3<i32>,
    /// Raw temperature output, if the sensor provides one.
    pub temperature: Option<i16>,
}

impl RawMagSample {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self {
            mag: Vector3::new(x, y, z),
            temperature: None,
        }
    }

    pub fn from_raw(mag: [i16; 3], temperature: Option<i16>) -> Self {
        Self {
            mag: Vector3::from(mag.map(i32::from)),
            temperature,
        }
    }
}

/// Magnetometer reading with hard- and soft-iron correction applied.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagReading {
    pub mag: Vector3<f32>,
    pub temperature: Option<i16>,
}
