use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use crate::{
    calibration::{correction::CorrectionModel, mag_routine::calibrate_mag, CalibrationState, MagCalib},
    drivers::lis3mdl::{DataRate, Lis3mdl},
    errors::{CalibrationError, CompassError},
    heading::heading_of,
    hw_abstraction::{CalibrationStore, DataRateControl, Magnetometer, PassthroughHub},
    sync::cancel::CancelToken,
    types::measurements::{MagReading, RawMagSample},
};

/// A magnetometer bundled with the correction model it reports through.
///
/// The model is borrowed, so it can be shared with other readers, and also
/// outlive the compass to be handed to the next one.
pub struct Compass<'m, MAG, DELAY, STORE, M: RawMutex = CriticalSectionRawMutex> {
    mag: MAG,
    delay: DELAY,
    store: STORE,
    model: &'m CorrectionModel<M>,
}

impl<'m, MAG, DELAY, STORE, M> Compass<'m, MAG, DELAY, STORE, M>
where
    MAG: Magnetometer,
    DELAY: DelayNs,
    STORE: CalibrationStore,
    M: RawMutex,
{
    pub fn new(mag: MAG, delay: DELAY, store: STORE, model: &'m CorrectionModel<M>) -> Self {
        Self {
            mag,
            delay,
            store,
            model,
        }
    }

    pub fn release(self) -> (MAG, DELAY, STORE) {
        (self.mag, self.delay, self.store)
    }

    pub fn model(&self) -> &'m CorrectionModel<M> {
        self.model
    }

    pub async fn raw_reading(&mut self) -> Result<RawMagSample, CompassError> {
        Ok(self.mag.read_raw_mag().await?)
    }

    /// Sample with the active hard- and soft-iron correction applied.
    pub async fn reading(&mut self) -> Result<MagReading, CompassError> {
        let raw = self.raw_reading().await?;
        Ok(MagReading {
            mag: self.model.corrected_reading(raw.mag),
            temperature: raw.temperature,
        })
    }

    /// Heading in degrees from a fresh corrected reading.
    pub async fn heading(&mut self) -> Result<f32, CompassError> {
        let reading = self.reading().await?;
        Ok(heading_of(&reading.mag))
    }

    pub fn is_calibrated(&self) -> bool {
        self.model.is_calibrated()
    }

    /// Run a calibration with an explicit configuration, then persist and
    /// activate the result. Readings taken through the shared model keep the
    /// previous correction until the run succeeds.
    pub async fn calibrate_with(
        &mut self,
        config: &MagCalib,
        cancel: Option<CancelToken<'_>>,
    ) -> Result<CalibrationState, CompassError> {
        let _run = self.model.begin_calibration()?;

        let state = calibrate_mag(config, &mut self.mag, &mut self.delay, cancel).await?;
        self.model.commit(&mut self.store, state).await?;

        Ok(state)
    }
}

impl<MAG, DELAY, STORE, M> Compass<'_, MAG, DELAY, STORE, M>
where
    MAG: Magnetometer + DataRateControl,
    DELAY: DelayNs,
    STORE: CalibrationStore,
    M: RawMutex,
{
    pub async fn data_rate(&mut self) -> Result<DataRate, CompassError> {
        Ok(self.mag.data_rate().await?)
    }

    pub async fn set_data_rate(&mut self, rate: DataRate) -> Result<(), CompassError> {
        self.mag.set_data_rate(rate).await?;
        debug!("Magnetometer data rate set to {} Hz", rate.hz());
        Ok(())
    }

    /// Calibrate from `sample_count` samples, polled at the sensor's current
    /// data rate.
    pub async fn calibrate(
        &mut self,
        sample_count: usize,
        cancel: Option<CancelToken<'_>>,
    ) -> Result<CalibrationState, CompassError> {
        if self.model.is_calibrating() {
            Err(CalibrationError::CalibrationInProgress)?
        }

        let rate = self
            .mag
            .data_rate()
            .await
            .map_err(CalibrationError::SensorUnavailable)?;

        self.calibrate_with(&MagCalib::from_data_rate(rate, sample_count), cancel)
            .await
    }
}

impl<I2C, DELAY, STORE, M> Compass<'_, Lis3mdl<I2C>, DELAY, STORE, M>
where
    I2C: I2c,
    DELAY: DelayNs,
    STORE: CalibrationStore,
    M: RawMutex,
{
    /// Route the hub's auxiliary bus through, then bring up the magnetometer
    /// behind it.
    pub async fn init<HUB: PassthroughHub>(&mut self, hub: &mut HUB) -> Result<(), CompassError> {
        hub.enable_passthrough().await?;
        self.mag.init(&mut self.delay).await?;
        info!("Compass ready, calibrated: {}", self.is_calibrated());
        Ok(())
    }
}
