use embedded_hal_async::delay::DelayNs;
use nalgebra::Vector3;

#[allow(unused_imports)]
use num_traits::Float as _;

use super::{CalibrationState, MagCalib};
use crate::{
    errors::{Axis, CalibrationError},
    hw_abstraction::Magnetometer,
    sync::cancel::CancelToken,
};

/// Routine to calibrate the magnetometer for hard- and soft-iron distortion.
///
/// Collects `config.sample_count` raw samples, `config.delay_ms` apart, while
/// the sensor is rotated through as many orientations as possible. The
/// returned state is not yet active, it must be committed to the
/// [`CorrectionModel`](super::correction::CorrectionModel).
pub async fn calibrate_mag<MAG: Magnetometer, D: DelayNs>(
    config: &MagCalib,
    mag: &mut MAG,
    delay: &mut D,
    cancel: Option<CancelToken<'_>>,
) -> Result<CalibrationState, CalibrationError> {
    const ID: &str = "mag_calib";

    if config.sample_count == 0 {
        Err(CalibrationError::InvalidSampleCount)?
    }

    info!(
        "{}: Starting calibration, {} samples {} ms apart",
        ID, config.sample_count, config.delay_ms
    );

    let first = read_sample(mag).await?;
    let mut window = SampleWindow::new(first);

    for index in 1..config.sample_count {
        if cancel.is_some_and(|token| token.is_canceled()) {
            warn!("{}: Canceled after {} samples", ID, index);
            Err(CalibrationError::Cancelled)?
        }

        delay.delay_ms(config.delay_ms).await;
        window.update(read_sample(mag).await?);

        if index % 100 == 0 {
            let span = window.span();
            debug!(
                "{}: {} samples, span [{}, {}, {}]",
                ID, index, span.x, span.y, span.z
            );
        }
    }

    let state = window.estimate().inspect_err(|error| {
        error!("{}: Calibration failed: {:?}", ID, error);
    })?;

    info!(
        "{}: Calibration complete, offset: [{}, {}, {}], scale: [{}, {}, {}]",
        ID,
        state.offset.x,
        state.offset.y,
        state.offset.z,
        state.scale.x,
        state.scale.y,
        state.scale.z
    );

    Ok(state)
}

async fn read_sample<MAG: Magnetometer>(mag: &mut MAG) -> Result<Vector3<i32>, CalibrationError> {
    match mag.read_raw_mag().await {
        Ok(sample) => Ok(sample.mag),
        Err(error) => {
            error!("Magnetometer read failed during calibration: {:?}", error);
            Err(CalibrationError::SensorUnavailable(error))
        }
    }
}

/// Running per-axis extrema of the samples collected by one calibration run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleWindow {
    min: Vector3<i32>,
    max: Vector3<i32>,
}

impl SampleWindow {
    /// Seeded from a real sample. Seeding with zero would stretch the range
    /// towards the origin, which the sensor output need not include.
    pub fn new(first: Vector3<i32>) -> Self {
        Self {
            min: first,
            max: first,
        }
    }

    pub fn update(&mut self, sample: Vector3<i32>) {
        self.min = self.min.zip_map(&sample, |a, b| a.min(b));
        self.max = self.max.zip_map(&sample, |a, b| a.max(b));
    }

    pub fn min(&self) -> Vector3<i32> {
        self.min
    }

    pub fn max(&self) -> Vector3<i32> {
        self.max
    }

    pub fn span(&self) -> Vector3<i32> {
        self.max - self.min
    }

    /// Derive the offset which centers the observed range on the origin, and
    /// the scale which stretches every axis to the mean span of all three.
    pub fn estimate(&self) -> Result<CalibrationState, CalibrationError> {
        let span = self.span();

        if let Some(axis) = Axis::ALL.into_iter().find(|axis| span[axis.index()] == 0) {
            Err(CalibrationError::CalibrationFailed { axis })?
        }

        let avg_span = (self.max.sum() - self.min.sum()) as f32 / 3.0;

        let offset = self
            .max
            .zip_map(&self.min, |hi, lo| -(((hi + lo) as f32 / 2.0).round() as i32));
        let scale = span.map(|s| avg_span / s as f32);

        Ok(CalibrationState {
            offset,
            scale,
            calibrated: true,
        })
    }
}
