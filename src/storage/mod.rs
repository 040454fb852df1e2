//! Backends for persisting calibration vectors.
//!
//! Values are encoded with `postcard`. [`FlashStore`] keeps them in a NOR
//! flash region managed by `sequential-storage`, [`MemoryStore`] keeps them
//! in RAM for targets without persistent storage.

use core::ops::Range;

use embedded_storage_async::nor_flash::NorFlash;
use heapless::Vec;
use sequential_storage::{
    cache::NoCache,
    map::{fetch_item, store_item, SerializationError, Value},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    errors::{
        adapter::{postcard::PostcardError, sequential_storage::SequentialError},
        CompassError,
    },
    hw_abstraction::{CalibrationStore, StorageKey},
};

/// Largest encoded value a store accepts, in bytes.
pub const VALUE_CAPACITY: usize = 32;

struct Wrap<T>(T);

impl<T: Serialize + DeserializeOwned> Value<'_> for Wrap<T> {
    fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        match postcard::to_slice(&self.0, buffer) {
            Ok(bytes) => Ok(bytes.len()),
            Err(postcard::Error::SerializeBufferFull) => Err(SerializationError::BufferTooSmall),
            Err(_) => Err(SerializationError::InvalidData),
        }
    }

    fn deserialize_from(buffer: &'_ [u8]) -> Result<Self, SerializationError>
    where
        Self: Sized,
    {
        postcard::from_bytes(buffer)
            .map(Wrap)
            .map_err(|_| SerializationError::InvalidFormat)
    }
}

/// Calibration storage in a region of NOR flash.
pub struct FlashStore<F> {
    flash: F,
    range: Range<u32>,
    buffer: [u8; 128],
}

impl<F: NorFlash> FlashStore<F> {
    /// The `range` must be aligned to the flash erase size and span at least
    /// two erase pages.
    pub fn new(flash: F, range: Range<u32>) -> Self {
        FlashStore {
            flash,
            range,
            buffer: [0u8; 128],
        }
    }

    pub fn release(self) -> F {
        self.flash
    }
}

impl<F: NorFlash> CalibrationStore for FlashStore<F> {
    async fn load<V: Serialize + DeserializeOwned>(
        &mut self,
        key: StorageKey,
    ) -> Result<Option<V>, CompassError> {
        let item = fetch_item::<u16, Wrap<V>, _>(
            &mut self.flash,
            self.range.clone(),
            &mut NoCache::new(),
            &mut self.buffer,
            &key.id(),
        )
        .await
        .map_err(SequentialError::from)?;

        if item.is_none() {
            debug!("No value stored for '{}'", key.as_str());
        }

        Ok(item.map(|Wrap(value)| value))
    }

    async fn store<V: Serialize + DeserializeOwned>(
        &mut self,
        key: StorageKey,
        value: V,
    ) -> Result<(), CompassError> {
        store_item::<u16, Wrap<V>, _>(
            &mut self.flash,
            self.range.clone(),
            &mut NoCache::new(),
            &mut self.buffer,
            &key.id(),
            &Wrap(value),
        )
        .await
        .map_err(SequentialError::from)?;

        trace!("Stored '{}' in flash", key.as_str());
        Ok(())
    }
}

/// Calibration storage kept in RAM, values are lost on reset.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: [Option<Vec<u8, VALUE_CAPACITY>>; 2],
}

impl MemoryStore {
    pub const fn new() -> Self {
        Self {
            slots: [None, None],
        }
    }
}

impl CalibrationStore for MemoryStore {
    async fn load<V: Serialize + DeserializeOwned>(
        &mut self,
        key: StorageKey,
    ) -> Result<Option<V>, CompassError> {
        match &self.slots[key.slot()] {
            Some(bytes) => {
                let value = postcard::from_bytes(bytes).map_err(PostcardError::from)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn store<V: Serialize + DeserializeOwned>(
        &mut self,
        key: StorageKey,
        value: V,
    ) -> Result<(), CompassError> {
        let mut buffer = [0u8; VALUE_CAPACITY];
        let bytes = postcard::to_slice(&value, &mut buffer).map_err(PostcardError::from)?;
        let bytes = Vec::from_slice(bytes).map_err(|_| PostcardError::SerializeBufferFull)?;
        self.slots[key.slot()] = Some(bytes);
        Ok(())
    }
}
