//! Backend trait for filesystem operations

use super::error::DiskCacheError;
use crate::transport::ByteStream;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Abstraction over filesystem operations to support multiple backends
#[async_trait]
pub trait DiskBackend: Send + Sync {
    /// Drain `stream` into `path` atomically (temp file + rename).
    /// Returns the number of bytes written. An empty stream leaves no file.
    async fn write_stream_atomic(&self, path: &Path, stream: ByteStream)
        -> Result<u64, DiskCacheError>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<(), DiskCacheError>;

    /// Create directory and all parent directories
    async fn create_dir_all(&self, path: &Path) -> Result<(), DiskCacheError>;

    /// Remove a directory and everything under it
    async fn remove_dir_all(&self, path: &Path) -> Result<(), DiskCacheError>;

    /// Get file size in bytes
    async fn file_size(&self, path: &Path) -> Result<u64, DiskCacheError>;

    /// List all files in a directory
    async fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, DiskCacheError>;
}
