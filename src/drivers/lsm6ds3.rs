//! Sensor hub controls of the ST LSM6DS3 IMU, the magnetometer sits on its
//! auxiliary I2C master.

use bitflags::bitflags;
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use crate::{errors::DeviceError, hw_abstraction::PassthroughHub};

pub const DEFAULT_ADDRESS: u8 = 0x6A;

/// Sensor hub configuration register.
pub const MASTER_CONFIG: u8 = 0x1A;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MasterConfig: u8 {
        const DRDY_ON_INT1 = 0x80;
        const DATA_VALID_SEL_FIFO = 0x40;
        const START_CONFIG = 0x10;
        const PULL_UP_EN = 0x08;
        const PASS_THROUGH_MODE = 0x04;
        const IRON_EN = 0x02;
        const MASTER_ON = 0x01;
    }
}

pub struct Lsm6ds3Hub<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C: I2c, D: DelayNs> Lsm6ds3Hub<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_address(i2c, delay, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    pub async fn master_config(&mut self) -> Result<MasterConfig, DeviceError> {
        let mut buf = [0u8];
        self.i2c
            .write_read(self.address, &[MASTER_CONFIG], &mut buf)
            .await
            .map_err(|e| DeviceError::I2c(e.into()))?;
        Ok(MasterConfig::from_bits_retain(buf[0]))
    }

    async fn write_master_config(&mut self, config: MasterConfig) -> Result<(), DeviceError> {
        self.i2c
            .write(self.address, &[MASTER_CONFIG, config.bits()])
            .await
            .map_err(|e| DeviceError::I2c(e.into()))
    }

    /// Read-modify-write of a single set of flags.
    async fn update(&mut self, flags: MasterConfig, value: bool) -> Result<(), DeviceError> {
        let mut config = self.master_config().await?;
        config.set(flags, value);
        self.write_master_config(config).await
    }
}

impl<I2C: I2c, D: DelayNs> PassthroughHub for Lsm6ds3Hub<I2C, D> {
    /// Stop the hub's I2C master and connect the auxiliary bus to the main
    /// bus. Every step is its own register write, the hub must see the
    /// master stopped before the pull-ups and pass-through change.
    async fn enable_passthrough(&mut self) -> Result<(), DeviceError> {
        self.update(MasterConfig::START_CONFIG, true).await?;
        self.delay.delay_ms(10).await;
        self.update(MasterConfig::MASTER_ON, false).await?;
        self.update(MasterConfig::START_CONFIG, false).await?;
        self.update(MasterConfig::PULL_UP_EN, false).await?;
        self.update(MasterConfig::PASS_THROUGH_MODE, true).await?;

        debug!("LSM6DS3 sensor hub in pass-through mode");
        Ok(())
    }
}
