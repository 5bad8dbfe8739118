//! Two-tier image cache
//!
//! [`ImageCache`] puts the decoded-bitmap memory tier and the raw-blob disk
//! tier behind one facade. The tiers use different keys:
//! - memory: [`memory_cache_key`] (`uri` + target size)
//! - disk: the uri alone, so size variants share one download

pub mod disk;
mod error;
mod memory;
mod stats;

pub use disk::{DiskCache, DiskCacheError};
pub use error::CacheError;
pub use memory::MemoryCache;
pub use stats::{CacheStats, ImageCacheStats};

use std::path::PathBuf;

use crate::config::LoaderConfig;
use crate::decoder::{Bitmap, ImageSize};
use crate::transport::ByteStream;

/// Memory cache key for a uri displayed at `size`
pub fn memory_cache_key(uri: &str, size: ImageSize) -> String {
    format!("{}_{}", uri, size)
}

/// Facade over the memory and disk tiers
pub struct ImageCache {
    memory: MemoryCache,
    disk: DiskCache,
}

impl ImageCache {
    pub fn new(memory: MemoryCache, disk: DiskCache) -> Self {
        Self { memory, disk }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(MemoryCache::new(&config.memory), DiskCache::new(&config.disk))
    }

    /// Memory-tier lookup only. Recycled bitmaps are treated as absent.
    pub async fn get_decoded(&self, key: &str) -> Option<Bitmap> {
        self.memory.get(key).await
    }

    /// Overwrite the memory entry for `key`. Rejections by the memory tier
    /// (oversized bitmaps) are logged and otherwise ignored.
    pub async fn put_decoded(&self, key: &str, bitmap: Bitmap) {
        if let Err(e) = self.memory.put(key.to_string(), bitmap).await {
            tracing::warn!(key = %key, error = %e, "Bitmap not kept in memory cache");
        }
    }

    pub async fn remove_decoded(&self, key: &str) -> Option<Bitmap> {
        self.memory.remove(key).await
    }

    /// Path of the persisted blob for `uri`, if present and non-empty
    pub async fn get_disk_path(&self, uri: &str) -> Option<PathBuf> {
        self.disk.get(uri).await
    }

    /// Persist `stream` for `uri`. Returns false on any I/O failure.
    pub async fn save(&self, uri: &str, stream: ByteStream) -> bool {
        match self.try_save(uri, stream).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(uri = %uri, error = %e, "Failed to persist image blob");
                false
            }
        }
    }

    /// Like [`ImageCache::save`] but keeps the failure cause
    pub async fn try_save(&self, uri: &str, stream: ByteStream) -> Result<u64, CacheError> {
        Ok(self.disk.save(uri, stream).await?)
    }

    pub async fn remove_from_disk(&self, uri: &str) -> Result<bool, CacheError> {
        Ok(self.disk.remove(uri).await?)
    }

    pub async fn clear_memory(&self) {
        self.memory.clear().await;
    }

    pub async fn clear_disk(&self) -> Result<(), CacheError> {
        Ok(self.disk.clear().await?)
    }

    pub async fn stats(&self) -> ImageCacheStats {
        ImageCacheStats {
            memory: self.memory.stats().await,
            disk: self.disk.stats().await,
        }
    }
}
