use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EmbeddedI2cError {
    #[error("Bus error occurred. e.g. A START or a STOP condition is detected and is not located after a multiple of 9 SCL clock pulses.")]
    Bus,
    #[error("The arbitration was lost, e.g. electrical problems with the clock signal.")]
    ArbitrationLoss,
    #[error("A bus operation was not acknowledged, e.g. due to the addressed device not being available on the bus or the device not being ready to process requests at the moment.")]
    NoAcknowledge,
    #[error("The peripheral receive buffer was overrun.")]
    Overrun,
    #[error("A different error occurred.")]
    Other,
}

impl<E: embedded_hal::i2c::Error> From<E> for EmbeddedI2cError {
    fn from(value: E) -> Self {
        use embedded_hal::i2c::ErrorKind as E;
        match value.kind() {
            E::Bus => Self::Bus,
            E::ArbitrationLoss => Self::ArbitrationLoss,
            E::NoAcknowledge(_) => Self::NoAcknowledge,
            E::Overrun => Self::Overrun,
            _ => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

    #[test]
    fn maps_error_kinds() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        assert_eq!(EmbeddedI2cError::from(nack), EmbeddedI2cError::NoAcknowledge);
        assert_eq!(EmbeddedI2cError::from(ErrorKind::Bus), EmbeddedI2cError::Bus);
        assert_eq!(EmbeddedI2cError::from(ErrorKind::Other), EmbeddedI2cError::Other);
    }
}
