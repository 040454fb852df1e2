#![cfg_attr(not(any(test, feature = "std")), no_std)]

// Export the logging macros for either defmt or log
#[macro_use]
mod logging;

pub mod calibration;
pub mod compass;
pub mod consts;
pub mod drivers;
pub mod errors;
pub mod heading;
pub mod hw_abstraction;
pub mod storage;
pub mod sync;
pub mod types;

#[cfg(test)]
mod mock;

// Re-exported for implementors
pub use embassy_sync;
pub use embedded_hal_async;
pub use embedded_storage_async;
pub use heapless;
pub use nalgebra;

pub use calibration::{correction::CorrectionModel, CalibrationState, MagCalib};
pub use compass::Compass;
pub use errors::{CalibrationError, CompassError, DeviceError};
