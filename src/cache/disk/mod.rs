//! Disk-based blob cache
//!
//! Raw image bytes persisted under a key derived solely from the uri, so every
//! size variant of an image shares one blob. Files are written through a
//! [`DiskBackend`] (tokio::fs in production, an in-memory mock in tests).

pub use self::backend::DiskBackend;
pub use self::disk_cache::DiskCache;
pub use self::error::DiskCacheError;
pub use self::tokio_backend::TokioFsBackend;

pub mod backend;
mod disk_cache;
mod error;
pub mod tokio_backend;
mod utils;
