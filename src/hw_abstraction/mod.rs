use serde::{de::DeserializeOwned, Serialize};

use crate::{
    consts,
    drivers::lis3mdl::DataRate,
    errors::{CompassError, DeviceError},
    types::measurements::RawMagSample,
};

/// Source of raw, uncorrected magnetometer samples.
#[allow(async_fn_in_trait)]
pub trait Magnetometer {
    async fn read_raw_mag(&mut self) -> Result<RawMagSample, DeviceError>;
}

/// Magnetometers whose output data rate can be configured.
#[allow(async_fn_in_trait)]
pub trait DataRateControl {
    async fn data_rate(&mut self) -> Result<DataRate, DeviceError>;
    async fn set_data_rate(&mut self, rate: DataRate) -> Result<(), DeviceError>;
}

/// A sensor hub which can route its auxiliary I2C master onto the main bus,
/// making the magnetometer behind it directly addressable.
#[allow(async_fn_in_trait)]
pub trait PassthroughHub {
    async fn enable_passthrough(&mut self) -> Result<(), DeviceError>;
}

/// Identifies one of the persisted calibration vectors.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageKey {
    HardIron,
    SoftIron,
}

impl StorageKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            StorageKey::HardIron => consts::HARD_IRON_KEY,
            StorageKey::SoftIron => consts::SOFT_IRON_KEY,
        }
    }

    /// Numeric key used by storage backends that cannot key by string.
    pub const fn id(self) -> u16 {
        match self {
            StorageKey::HardIron => 0x4301,
            StorageKey::SoftIron => 0x4302,
        }
    }

    pub(crate) const fn slot(self) -> usize {
        self as usize
    }
}

/// Persistent key-value storage for calibration vectors.
#[allow(async_fn_in_trait)]
pub trait CalibrationStore {
    /// Fetch the value stored under `key`, `None` if nothing was stored.
    async fn load<V: Serialize + DeserializeOwned>(
        &mut self,
        key: StorageKey,
    ) -> Result<Option<V>, CompassError>;

    async fn store<V: Serialize + DeserializeOwned>(
        &mut self,
        key: StorageKey,
        value: V,
    ) -> Result<(), CompassError>;

    /// Fetch the value stored under `key`, or `default` if it is missing or
    /// could not be read.
    async fn load_or<V: Serialize + DeserializeOwned>(&mut self, key: StorageKey, default: V) -> V {
        match self.load(key).await {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(error) => {
                warn!("Unable to load '{}' from storage: {:?}", key.as_str(), error);
                default
            }
        }
    }
}
