//! Test doubles for the hardware traits.

use std::collections::BTreeMap;

use embedded_hal_async::{
    delay::DelayNs,
    i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation},
};
use nalgebra::Vector3;

use crate::{
    drivers::lis3mdl::DataRate,
    errors::DeviceError,
    hw_abstraction::{DataRateControl, Magnetometer},
    types::measurements::RawMagSample,
};

/// Plays back a fixed list of samples, cycling when it runs out.
pub struct ReplayMagnetometer {
    samples: Vec<Vector3<i32>>,
    reads: usize,
    fail_after: Option<usize>,
    rate: DataRate,
}

impl ReplayMagnetometer {
    pub fn new(samples: Vec<Vector3<i32>>) -> Self {
        Self {
            samples,
            reads: 0,
            fail_after: None,
            rate: DataRate::default(),
        }
    }

    /// Stop responding after `reads` successful reads.
    pub fn fail_after(self, reads: usize) -> Self {
        Self {
            fail_after: Some(reads),
            ..self
        }
    }

    pub fn with_rate(self, rate: DataRate) -> Self {
        Self { rate, ..self }
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl DataRateControl for ReplayMagnetometer {
    async fn data_rate(&mut self) -> Result<DataRate, DeviceError> {
        Ok(self.rate)
    }

    async fn set_data_rate(&mut self, rate: DataRate) -> Result<(), DeviceError> {
        self.rate = rate;
        Ok(())
    }
}

impl Magnetometer for ReplayMagnetometer {
    async fn read_raw_mag(&mut self) -> Result<RawMagSample, DeviceError> {
        self.reads += 1;
        if self.fail_after.is_some_and(|limit| self.reads > limit) || self.samples.is_empty() {
            return Err(DeviceError::Timeout { millis: 10 });
        }
        let mag = self.samples[(self.reads - 1) % self.samples.len()];
        Ok(RawMagSample {
            mag,
            temperature: None,
        })
    }
}

/// Delay which returns immediately, remembering every requested duration [ms]
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub calls: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.calls.push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.calls.push(ms);
    }
}

/// Register-level I2C bus with any number of devices attached. A write sets
/// the register pointer with its first byte and stores the rest, reads
/// continue from the pointer. Both auto-increment.
#[derive(Debug, Default)]
pub struct MockI2c {
    devices: BTreeMap<u8, [u8; 256]>,
    pointer: u8,
    /// Every register write, as `(address, register, value)`.
    pub writes: Vec<(u8, u8, u8)>,
    /// Number of transactions to refuse before devices start to acknowledge.
    pub busy_for: usize,
}

impl MockI2c {
    pub fn with_device(mut self, address: u8) -> Self {
        self.devices.insert(address, [0; 256]);
        self
    }

    pub fn set_reg(&mut self, address: u8, reg: u8, value: u8) {
        if let Some(regs) = self.devices.get_mut(&address) {
            regs[reg as usize] = value;
        }
    }

    pub fn reg(&self, address: u8, reg: u8) -> u8 {
        self.devices.get(&address).map_or(0, |regs| regs[reg as usize])
    }

    pub fn set_regs(&mut self, address: u8, start: u8, values: &[u8]) {
        for (offset, value) in values.iter().enumerate() {
            self.set_reg(address, start.wrapping_add(offset as u8), *value);
        }
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        if self.busy_for > 0 {
            self.busy_for -= 1;
            return Err(nack);
        }
        let Some(regs) = self.devices.get_mut(&address) else {
            return Err(nack);
        };

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    if let Some((reg, values)) = bytes.split_first() {
                        self.pointer = *reg;
                        for value in values {
                            regs[self.pointer as usize] = *value;
                            self.writes.push((address, self.pointer, *value));
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = regs[self.pointer as usize];
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}
