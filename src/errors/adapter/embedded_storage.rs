use embedded_storage_async::nor_flash::{NorFlashError, NorFlashErrorKind};

#[non_exhaustive]
#[derive(
    serde::Serialize, serde::Deserialize, thiserror::Error, Debug, Clone, Copy, Eq, PartialEq,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    #[error("The arguments are not properly aligned.")]
    NotAligned,
    #[error("The arguments are out of bounds.")]
    OutOfBounds,
    #[error("Error specific to the implementation.")]
    Other,
}

impl<S: NorFlashError> From<S> for FlashError {
    fn from(value: S) -> Self {
        match value.kind() {
            NorFlashErrorKind::NotAligned => FlashError::NotAligned,
            NorFlashErrorKind::OutOfBounds => FlashError::OutOfBounds,
            _ => FlashError::Other,
        }
    }
}
