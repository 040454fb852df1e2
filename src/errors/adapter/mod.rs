pub mod embedded_hal;
pub mod embedded_storage;
pub mod postcard;
pub mod sequential_storage;
