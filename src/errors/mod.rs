use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod adapter;
use adapter::{
    embedded_hal::EmbeddedI2cError, postcard::PostcardError, sequential_storage::SequentialError,
};

#[non_exhaustive]
#[derive(Serialize, Deserialize, Error, Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CompassError {
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),
    #[error("Postcard ser/de error: {0}")]
    Postcard(#[from] PostcardError),
    #[error("Sequential storage error: {0}")]
    Sequential(#[from] SequentialError),
}

#[non_exhaustive]
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    #[error("The device is not responding after {millis} ms.")]
    Timeout { millis: u64 },
    #[error("The device was not identified correctly.")]
    IdentificationError,
    #[error("I2c error: {0}")]
    I2c(#[from] EmbeddedI2cError),
}

/// Sensor axis, used to point out which axis made a calibration fail.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub const fn index(self) -> usize {
        self as usize
    }
}

#[non_exhaustive]
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    #[error("The scale vector must be strictly positive and finite on every axis.")]
    InvalidCalibration,
    #[error("No variation was observed on the {axis:?} axis, the sensor must be rotated through all orientations.")]
    CalibrationFailed { axis: Axis },
    #[error("The magnetometer is not sending data: {0}")]
    SensorUnavailable(DeviceError),
    #[error("Another calibration is already running.")]
    CalibrationInProgress,
    #[error("The calibration was canceled before it completed.")]
    Cancelled,
    #[error("A calibration requires at least one sample.")]
    InvalidSampleCount,
}
