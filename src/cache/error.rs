//! Cache error types
//!
//! This module defines error types for cache operations.

use thiserror::Error;

/// Cache error types
#[derive(Debug, Error)]
pub enum CacheError {
    /// Entry is larger than the memory tier accepts
    #[error("Entry of {size} bytes exceeds the {max} byte item limit")]
    ItemTooLarge { size: u64, max: u64 },
    /// The byte stream handed to the disk tier was empty
    #[error("Refusing to persist an empty blob")]
    EmptyBlob,
    /// I/O error (for disk cache)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
