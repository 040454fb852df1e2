//! Driver for the ST LIS3MDL 3-axis magnetometer.

use embedded_hal_async::{delay::DelayNs, i2c::I2c};
use serde::{Deserialize, Serialize};

use crate::{
    consts,
    errors::DeviceError,
    hw_abstraction::{DataRateControl, Magnetometer},
    types::measurements::RawMagSample,
};

pub const DEFAULT_ADDRESS: u8 = 0x1E;
pub const WHO_AM_I_VALUE: u8 = 0x3D;

#[allow(unused)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum Register {
    WhoAmI = 0x0F,
    CtrlReg1 = 0x20,
    CtrlReg2 = 0x21,
    CtrlReg3 = 0x22,
    CtrlReg4 = 0x23,
    CtrlReg5 = 0x24,
    StatusReg = 0x27,
    /// First of the X, Y, Z and temperature output registers, little-endian.
    OutXL = 0x28,
}

/// Output data rate bits of `CTRL_REG1`.
const ODR_MASK: u8 = 0b0001_1100;
const ODR_SHIFT: u8 = 2;

/// Continuous-conversion mode, written to `CTRL_REG3`.
const MODE_CONTINUOUS: u8 = 0x00;

/// Output data rate, `0.625 * 2^n` Hz for selector `n`.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataRate {
    Hz0_625 = 0,
    Hz1_25 = 1,
    Hz2_5 = 2,
    Hz5 = 3,
    #[default]
    Hz10 = 4,
    Hz20 = 5,
    Hz40 = 6,
    Hz80 = 7,
}

impl DataRate {
    pub const ALL: [DataRate; 8] = [
        DataRate::Hz0_625,
        DataRate::Hz1_25,
        DataRate::Hz2_5,
        DataRate::Hz5,
        DataRate::Hz10,
        DataRate::Hz20,
        DataRate::Hz40,
        DataRate::Hz80,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    pub fn hz(self) -> f32 {
        consts::BASE_DATA_RATE_HZ * (1u32 << self.index()) as f32
    }

    /// Polling interval which never outruns the sensor, its sample period
    /// plus a margin.
    pub fn sample_delay_ms(self) -> u32 {
        (1000.0 / self.hz() * consts::SAMPLE_PERIOD_MARGIN) as u32
    }
}

/// Convert the raw temperature output to degrees Celsius.
pub fn temperature_celsius(raw: i16) -> f32 {
    25.0 + raw as f32 / 8.0
}

pub struct Lis3mdl<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Lis3mdl<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    async fn read_reg(&mut self, reg: Register) -> Result<u8, DeviceError> {
        let mut buf = [0u8];
        self.i2c
            .write_read(self.address, &[reg as u8], &mut buf)
            .await
            .map_err(|e| DeviceError::I2c(e.into()))?;
        Ok(buf[0])
    }

    async fn write_reg(&mut self, reg: Register, value: u8) -> Result<(), DeviceError> {
        self.i2c
            .write(self.address, &[reg as u8, value])
            .await
            .map_err(|e| DeviceError::I2c(e.into()))
    }

    pub async fn who_am_i(&mut self) -> Result<u8, DeviceError> {
        self.read_reg(Register::WhoAmI).await
    }

    /// Probe the address until the device acknowledges, waiting `delay_ms`
    /// between attempts.
    pub async fn wait_for_address_ready<D: DelayNs>(
        &mut self,
        delay: &mut D,
        max_retries: u32,
        delay_ms: u32,
    ) -> Result<(), DeviceError> {
        for _ in 0..=max_retries {
            if self.i2c.write(self.address, &[]).await.is_ok() {
                return Ok(());
            }
            delay.delay_ms(delay_ms).await;
        }

        let millis = (max_retries as u64 + 1) * delay_ms as u64;
        error!("No response from I2C address {} after {} ms", self.address, millis);
        Err(DeviceError::Timeout { millis })
    }

    /// Check the device identity and start continuous conversion. The sensor
    /// hub must already be in pass-through mode.
    pub async fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), DeviceError> {
        self.wait_for_address_ready(delay, 100, 10).await?;

        let id = self.who_am_i().await?;
        if id != WHO_AM_I_VALUE {
            error!("LIS3MDL self check failed, WHO_AM_I was {}", id);
            return Err(DeviceError::IdentificationError);
        }

        self.write_reg(Register::CtrlReg3, MODE_CONTINUOUS).await?;
        delay.delay_ms(10).await;

        debug!("LIS3MDL initialized at address {}", self.address);
        Ok(())
    }

    pub async fn set_data_rate(&mut self, rate: DataRate) -> Result<(), DeviceError> {
        let ctrl1 = self.read_reg(Register::CtrlReg1).await?;
        let ctrl1 = (ctrl1 & !ODR_MASK) | (rate.index() << ODR_SHIFT);
        self.write_reg(Register::CtrlReg1, ctrl1).await
    }

    pub async fn data_rate(&mut self) -> Result<DataRate, DeviceError> {
        let ctrl1 = self.read_reg(Register::CtrlReg1).await?;
        let index = (ctrl1 & ODR_MASK) >> ODR_SHIFT;
        // Three bits can not exceed the table
        Ok(DataRate::from_index(index).unwrap_or_default())
    }

    /// Read the X, Y, Z and temperature outputs in one burst.
    pub async fn read_raw(&mut self) -> Result<RawMagSample, DeviceError> {
        let mut buf = [0u8; 8];
        self.i2c
            .write_read(self.address, &[Register::OutXL as u8], &mut buf)
            .await
            .map_err(|e| DeviceError::I2c(e.into()))?;

        let word = |i: usize| i16::from_le_bytes([buf[2 * i], buf[2 * i + 1]]);
        Ok(RawMagSample::from_raw([word(0), word(1), word(2)], Some(word(3))))
    }
}

impl<I2C: I2c> Magnetometer for Lis3mdl<I2C> {
    async fn read_raw_mag(&mut self) -> Result<RawMagSample, DeviceError> {
        self.read_raw().await
    }
}

impl<I2C: I2c> DataRateControl for Lis3mdl<I2C> {
    async fn data_rate(&mut self) -> Result<DataRate, DeviceError> {
        Lis3mdl::data_rate(self).await
    }

    async fn set_data_rate(&mut self, rate: DataRate) -> Result<(), DeviceError> {
        Lis3mdl::set_data_rate(self, rate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::adapter::embedded_hal::EmbeddedI2cError;
    use crate::mock::{MockI2c, RecordingDelay};
    use futures_executor::block_on;
    use nalgebra::Vector3;

    fn bus() -> MockI2c {
        let mut bus = MockI2c::default().with_device(DEFAULT_ADDRESS);
        bus.set_reg(DEFAULT_ADDRESS, Register::WhoAmI as u8, WHO_AM_I_VALUE);
        bus
    }

    #[test]
    fn data_rates() {
        assert_eq!(DataRate::Hz0_625.hz(), 0.625);
        assert_eq!(DataRate::Hz80.hz(), 80.0);
        assert_eq!(DataRate::Hz10.sample_delay_ms(), 110);
        assert_eq!(DataRate::Hz20.sample_delay_ms(), 55);
        assert_eq!(DataRate::Hz0_625.sample_delay_ms(), 1760);
        assert_eq!(DataRate::from_index(5), Some(DataRate::Hz20));
        assert_eq!(DataRate::from_index(8), None);
    }

    #[test]
    fn init_starts_continuous_mode() {
        let mut bus = bus();
        bus.set_reg(DEFAULT_ADDRESS, Register::CtrlReg3 as u8, 0x03);
        let mut mag = Lis3mdl::new(bus);
        let mut delay = RecordingDelay::default();

        block_on(mag.init(&mut delay)).unwrap();

        let bus = mag.release();
        assert_eq!(bus.reg(DEFAULT_ADDRESS, Register::CtrlReg3 as u8), 0x00);
        assert_eq!(delay.calls, vec![10]);
    }

    #[test]
    fn init_rejects_unknown_device() {
        let mut bus = bus();
        bus.set_reg(DEFAULT_ADDRESS, Register::WhoAmI as u8, 0x6A);
        let mut mag = Lis3mdl::new(bus);

        let result = block_on(mag.init(&mut RecordingDelay::default()));
        assert_eq!(result, Err(DeviceError::IdentificationError));
    }

    #[test]
    fn waits_for_busy_device() {
        let mut bus = bus();
        bus.busy_for = 3;
        let mut mag = Lis3mdl::new(bus);
        let mut delay = RecordingDelay::default();

        block_on(mag.wait_for_address_ready(&mut delay, 100, 10)).unwrap();
        assert_eq!(delay.calls, vec![10, 10, 10]);
    }

    #[test]
    fn missing_device_times_out() {
        let mut mag = Lis3mdl::new(MockI2c::default());
        let mut delay = RecordingDelay::default();

        let result = block_on(mag.wait_for_address_ready(&mut delay, 4, 10));
        assert_eq!(result, Err(DeviceError::Timeout { millis: 50 }));
        assert_eq!(delay.calls.len(), 5);
    }

    #[test]
    fn data_rate_only_touches_odr_bits() {
        let mut bus = bus();
        bus.set_reg(DEFAULT_ADDRESS, Register::CtrlReg1 as u8, 0b1110_0011);
        let mut mag = Lis3mdl::new(bus);

        block_on(async {
            mag.set_data_rate(DataRate::Hz20).await.unwrap();
            assert_eq!(mag.data_rate().await.unwrap(), DataRate::Hz20);

            mag.set_data_rate(DataRate::Hz0_625).await.unwrap();
            assert_eq!(mag.data_rate().await.unwrap(), DataRate::Hz0_625);
        });

        let bus = mag.release();
        assert_eq!(bus.reg(DEFAULT_ADDRESS, Register::CtrlReg1 as u8), 0b1110_0011);
    }

    #[test]
    fn decodes_raw_sample() {
        let mut bus = bus();
        let bytes = [100i16, -50, 30, -16]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect::<Vec<u8>>();
        bus.set_regs(DEFAULT_ADDRESS, Register::OutXL as u8, &bytes);
        let mut mag = Lis3mdl::new(bus);

        let sample = block_on(mag.read_raw_mag()).unwrap();
        assert_eq!(sample.mag, Vector3::new(100, -50, 30));
        assert_eq!(sample.temperature, Some(-16));
        assert_eq!(temperature_celsius(-16), 23.0);
    }

    #[test]
    fn bus_errors_are_mapped() {
        let mut mag = Lis3mdl::new(MockI2c::default());
        let result = block_on(mag.read_raw());
        assert_eq!(
            result,
            Err(DeviceError::I2c(EmbeddedI2cError::NoAcknowledge))
        );
    }
}
