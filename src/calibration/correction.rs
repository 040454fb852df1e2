use core::cell::Cell;

use embassy_sync::blocking_mutex::{
    raw::{CriticalSectionRawMutex, RawMutex},
    Mutex,
};
use nalgebra::Vector3;

use super::{scale_is_valid, CalibrationState};
use crate::{
    errors::{CalibrationError, CompassError},
    hw_abstraction::{CalibrationStore, StorageKey},
    sync::run_guard::{RunFlag, RunGuard},
};

/// Proof that the holder is the only calibration run on a [`CorrectionModel`].
pub type CalibrationRun<'a> = RunGuard<'a>;

/// Owns the active hard- and soft-iron correction of a magnetometer.
///
/// The state sits behind a blocking mutex, so one model can be shared by
/// reference between a task producing readings and a task running a
/// calibration. Readers keep getting the previous correction until a new one
/// is committed, and a committed state is never observed half-written.
pub struct CorrectionModel<M: RawMutex = CriticalSectionRawMutex> {
    state: Mutex<M, Cell<CalibrationState>>,
    calibrating: RunFlag,
}

impl<M: RawMutex> Default for CorrectionModel<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> CorrectionModel<M> {
    /// Model using the factory default correction.
    pub const fn new() -> Self {
        Self::with_state(CalibrationState::const_default())
    }

    pub const fn with_state(state: CalibrationState) -> Self {
        Self {
            state: Mutex::new(Cell::new(state)),
            calibrating: RunFlag::new(),
        }
    }

    /// Load the correction vectors from `store`. Missing vectors fall back to
    /// the factory defaults, and the model only counts as calibrated if a
    /// hard-iron vector was found.
    pub async fn load<S: CalibrationStore>(store: &mut S) -> Self {
        let mut state = CalibrationState::const_default();

        match store.load::<Vector3<i32>>(StorageKey::HardIron).await {
            Ok(Some(offset)) => {
                state.offset = offset;
                state.calibrated = true;
            }
            Ok(None) => info!("No stored hard-iron correction, using factory default"),
            Err(error) => warn!("Unable to load hard-iron correction: {:?}", error),
        }

        let scale = store.load_or(StorageKey::SoftIron, state.scale).await;
        if scale_is_valid(&scale) {
            state.scale = scale;
        } else {
            warn!(
                "Discarding stored soft-iron correction [{}, {}, {}]",
                scale.x, scale.y, scale.z
            );
        }

        Self::with_state(state)
    }

    /// Snapshot of the active correction.
    pub fn state(&self) -> CalibrationState {
        self.state.lock(|state| state.get())
    }

    pub fn apply_hard_iron(&self, raw: Vector3<i32>) -> Vector3<i32> {
        self.state().apply_hard_iron(raw)
    }

    pub fn apply_soft_iron(&self, v: Vector3<i32>) -> Vector3<f32> {
        self.state().apply_soft_iron(v)
    }

    /// Apply hard-iron, then soft-iron correction, both from the same snapshot.
    pub fn corrected_reading(&self, raw: Vector3<i32>) -> Vector3<f32> {
        self.state().corrected(raw)
    }

    pub fn is_calibrated(&self) -> bool {
        self.state().calibrated
    }

    /// Claim the right to run a calibration. Fails while another run holds it.
    pub fn begin_calibration(&self) -> Result<CalibrationRun<'_>, CalibrationError> {
        self.calibrating
            .try_acquire()
            .ok_or(CalibrationError::CalibrationInProgress)
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrating.is_running()
    }

    /// Validate, persist and activate a new correction. If the scale is
    /// rejected or persisting fails, the previous correction stays active.
    pub async fn set_calibration<S: CalibrationStore>(
        &self,
        store: &mut S,
        offset: Vector3<i32>,
        scale: Vector3<f32>,
    ) -> Result<(), CompassError> {
        if !scale_is_valid(&scale) {
            warn!(
                "Rejecting soft-iron correction [{}, {}, {}]",
                scale.x, scale.y, scale.z
            );
            Err(CalibrationError::InvalidCalibration)?
        }

        store.store(StorageKey::HardIron, offset).await?;
        store.store(StorageKey::SoftIron, scale).await?;

        self.state.lock(|state| {
            state.set(CalibrationState {
                offset,
                scale,
                calibrated: true,
            })
        });

        info!(
            "New correction, offset: [{}, {}, {}], scale: [{}, {}, {}]",
            offset.x, offset.y, offset.z, scale.x, scale.y, scale.z
        );

        Ok(())
    }

    /// [`Self::set_calibration`] for the result of a calibration run.
    pub async fn commit<S: CalibrationStore>(
        &self,
        store: &mut S,
        state: CalibrationState,
    ) -> Result<(), CompassError> {
        self.set_calibration(store, state.offset, state.scale).await
    }
}
