use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The subset of Postcard errors that can occur when encoding or decoding
/// calibration vectors.
#[non_exhaustive]
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PostcardError {
    #[error("The serialize buffer is full")]
    SerializeBufferFull,
    #[error("Hit the end of buffer, expected more data")]
    DeserializeUnexpectedEnd,
    #[error("Found a varint that didn't terminate. Is the usize too big for this platform?")]
    DeserializeBadVarint,
    #[error("The original data was not well encoded")]
    DeserializeBadEncoding,
    #[error("Serde Serialization Error")]
    SerdeSerCustom,
    #[error("Serde Deserialization Error")]
    SerdeDeCustom,
    #[error("Some other serialization error occured")]
    Other,
}

impl From<postcard::Error> for PostcardError {
    fn from(value: postcard::Error) -> Self {
        match value {
            postcard::Error::SerializeBufferFull => Self::SerializeBufferFull,
            postcard::Error::DeserializeUnexpectedEnd => Self::DeserializeUnexpectedEnd,
            postcard::Error::DeserializeBadVarint => Self::DeserializeBadVarint,
            postcard::Error::DeserializeBadEncoding => Self::DeserializeBadEncoding,
            postcard::Error::SerdeSerCustom => Self::SerdeSerCustom,
            postcard::Error::SerdeDeCustom => Self::SerdeDeCustom,
            _ => Self::Other,
        }
    }
}
