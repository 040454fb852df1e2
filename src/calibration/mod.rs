pub mod correction;
pub mod mag_routine;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{consts, drivers::lis3mdl::DataRate};

/// Configuration of a single magnetometer calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagCalib {
    /// Number of raw samples to collect, must be at least one.
    pub sample_count: usize,
    /// Time to wait between consecutive samples [ms]
    pub delay_ms: u32,
}

impl MagCalib {
    /// Configuration which polls no faster than the sensor produces data.
    pub fn from_data_rate(rate: DataRate, sample_count: usize) -> Self {
        Self {
            sample_count,
            delay_ms: rate.sample_delay_ms(),
        }
    }
}

impl Default for MagCalib {
    fn default() -> Self {
        Self::from_data_rate(DataRate::default(), consts::DEFAULT_CALIBRATION_SAMPLES)
    }
}

/// Hard- and soft-iron correction for a magnetometer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    /// Additive correction, in raw sensor units.
    pub offset: Vector3<i32>,
    /// Per-axis multiplicative correction, strictly positive and finite.
    pub scale: Vector3<f32>,
    /// Whether the vectors came from an actual calibration rather than the
    /// factory defaults.
    pub calibrated: bool,
}

impl CalibrationState {
    pub const fn const_default() -> Self {
        let [ox, oy, oz] = consts::DEFAULT_HARD_IRON;
        let [sx, sy, sz] = consts::DEFAULT_SOFT_IRON;
        Self {
            offset: Vector3::new(ox, oy, oz),
            scale: Vector3::new(sx, sy, sz),
            calibrated: false,
        }
    }

    /// Remove hard-iron interference, `raw + offset`.
    pub fn apply_hard_iron(&self, raw: Vector3<i32>) -> Vector3<i32> {
        raw + self.offset
    }

    /// Remove soft-iron interference, `v .* scale`.
    pub fn apply_soft_iron(&self, v: Vector3<i32>) -> Vector3<f32> {
        v.map(|c| c as f32).component_mul(&self.scale)
    }

    /// Hard-iron correction followed by soft-iron correction. The order
    /// matters, the scale must be applied around the corrected center.
    pub fn corrected(&self, raw: Vector3<i32>) -> Vector3<f32> {
        self.apply_soft_iron(self.apply_hard_iron(raw))
    }
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self::const_default()
    }
}

/// Returns true if every scale component is strictly positive and finite.
pub fn scale_is_valid(scale: &Vector3<f32>) -> bool {
    scale.iter().all(|s| s.is_finite() && *s > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn state(offset: [i32; 3], scale: [f32; 3]) -> CalibrationState {
        CalibrationState {
            offset: offset.into(),
            scale: scale.into(),
            calibrated: true,
        }
    }

    #[test]
    fn corrected_reading_example() {
        let cal = state([-10, 20, 5], [1.0, 2.0, 0.5]);
        let corrected = cal.corrected(Vector3::new(100, -50, 30));
        assert_abs_diff_eq!(corrected, Vector3::new(90.0, -60.0, 17.5));
    }

    #[test]
    fn offset_is_applied_before_scale() {
        let cal = state([7, -3, 11], [1.5, 0.25, 3.0]);
        let samples = [
            Vector3::new(0, 0, 0),
            Vector3::new(-512, 300, 12),
            Vector3::new(4096, -4096, 1),
        ];
        for raw in samples {
            let expected = (raw + cal.offset).map(|c| c as f32).component_mul(&cal.scale);
            assert_abs_diff_eq!(cal.corrected(raw), expected);
        }
    }

    #[test]
    fn corrections_are_pure() {
        let cal = state([1, 2, 3], [2.0, 2.0, 2.0]);
        let raw = Vector3::new(10, 20, 30);
        assert_eq!(cal.apply_hard_iron(raw), cal.apply_hard_iron(raw));
        assert_eq!(cal.apply_soft_iron(raw), cal.apply_soft_iron(raw));
        assert_eq!(cal, state([1, 2, 3], [2.0, 2.0, 2.0]));
    }

    #[test]
    fn default_is_factory_constant() {
        let cal = CalibrationState::default();
        assert_eq!(cal.offset, Vector3::new(163, 1584, -7742));
        assert_eq!(cal.scale, Vector3::new(1.0, 1.0, 1.0));
        assert!(!cal.calibrated);
    }

    #[test]
    fn scale_validation() {
        assert!(scale_is_valid(&Vector3::new(1.0, 0.5, 2.0)));
        assert!(!scale_is_valid(&Vector3::new(1.0, 0.0, 2.0)));
        assert!(!scale_is_valid(&Vector3::new(1.0, -1.0, 2.0)));
        assert!(!scale_is_valid(&Vector3::new(f32::NAN, 1.0, 1.0)));
        assert!(!scale_is_valid(&Vector3::new(1.0, f32::INFINITY, 1.0)));
    }

    #[test]
    fn calib_config_from_data_rate() {
        let config = MagCalib::from_data_rate(DataRate::Hz20, 700);
        assert_eq!(config.delay_ms, 55);
        assert_eq!(MagCalib::default().sample_count, 700);
    }
}
