//! Main DiskCache implementation

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::backend::DiskBackend;
use super::error::DiskCacheError;
use super::tokio_backend::TokioFsBackend;
use super::utils;
use crate::cache::stats::{CacheStats, CacheStatsTracker};
use crate::config::DiskCacheConfig;
use crate::constants::DISK_BLOB_EXTENSION;
use crate::transport::ByteStream;

/// Disk-based blob cache keyed by uri
pub struct DiskCache {
    cache_dir: PathBuf,
    backend: Arc<dyn DiskBackend>,
    stats: CacheStatsTracker,
}

impl DiskCache {
    pub fn new(config: &DiskCacheConfig) -> Self {
        Self::with_backend(config.cache_dir.clone(), Arc::new(TokioFsBackend::new()))
    }

    pub fn with_backend(cache_dir: PathBuf, backend: Arc<dyn DiskBackend>) -> Self {
        Self {
            cache_dir,
            backend,
            stats: CacheStatsTracker::new(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path the blob for `uri` lives at, whether or not it exists yet
    pub fn path_for(&self, uri: &str) -> PathBuf {
        utils::blob_path(&self.cache_dir, uri)
    }

    /// Path of a persisted, non-empty blob for `uri`
    pub async fn get(&self, uri: &str) -> Option<PathBuf> {
        let path = self.path_for(uri);
        match self.backend.file_size(&path).await {
            Ok(size) if size > 0 => {
                self.stats.increment_hits();
                Some(path)
            }
            _ => {
                self.stats.increment_misses();
                None
            }
        }
    }

    /// Persist `stream` as the blob for `uri`, replacing any previous blob.
    /// Returns the number of bytes written.
    pub async fn save(&self, uri: &str, stream: ByteStream) -> Result<u64, DiskCacheError> {
        let path = self.path_for(uri);
        let written = self.backend.write_stream_atomic(&path, stream).await?;
        tracing::debug!(uri = %uri, path = %path.display(), bytes = written, "Blob persisted");
        Ok(written)
    }

    /// Delete the blob for `uri`. Returns true if a blob existed.
    pub async fn remove(&self, uri: &str) -> Result<bool, DiskCacheError> {
        let path = self.path_for(uri);
        let existed = self.backend.file_size(&path).await.is_ok();
        self.backend.delete_file(&path).await?;
        Ok(existed)
    }

    /// Delete every blob
    pub async fn clear(&self) -> Result<(), DiskCacheError> {
        let entries = utils::entries_dir(&self.cache_dir);
        self.backend.remove_dir_all(&entries).await?;
        self.backend.create_dir_all(&entries).await
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = utils::entries_dir(&self.cache_dir);
        let mut count = 0u64;
        let mut size = 0u64;
        if let Ok(files) = self.backend.read_dir(&entries).await {
            for file in files {
                if file.extension().and_then(|ext| ext.to_str()) != Some(DISK_BLOB_EXTENSION) {
                    continue;
                }
                if let Ok(len) = self.backend.file_size(&file).await {
                    count += 1;
                    size += len;
                }
            }
        }
        self.stats.snapshot(size, count)
    }
}
