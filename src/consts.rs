/// Factory hard-iron offset, shipped as a baseline correction for the board.
pub const DEFAULT_HARD_IRON: [i32; 3] = [163, 1584, -7742];

/// Neutral soft-iron scale.
pub const DEFAULT_SOFT_IRON: [f32; 3] = [1.0, 1.0, 1.0];

/// Number of samples taken by a calibration run unless configured otherwise.
pub const DEFAULT_CALIBRATION_SAMPLES: usize = 700;

/// Margin applied to the sensor sample period when polling, so that a new
/// sample is always available by the time it is read.
pub const SAMPLE_PERIOD_MARGIN: f32 = 1.1;

/// Lowest selectable magnetometer output data rate [Hz]
pub const BASE_DATA_RATE_HZ: f32 = 0.625;

/// Storage identifier of the hard-iron offset vector.
pub const HARD_IRON_KEY: &str = "compass-correction-hard";

/// Storage identifier of the soft-iron scale vector.
pub const SOFT_IRON_KEY: &str = "compass-correction-soft";
