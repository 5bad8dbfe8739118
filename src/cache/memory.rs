//! Memory cache implementation
//!
//! Decoded bitmaps keyed by memory cache key (`uri` + target size), backed by
//! moka. Eviction is by pixel-buffer weight and TTL.

use std::sync::Arc;

use super::error::CacheError;
use super::stats::{CacheStats, CacheStatsTracker};
use crate::config::MemoryCacheConfig;
use crate::decoder::Bitmap;

/// MemoryCache wraps moka for decoded bitmaps
pub struct MemoryCache {
    cache: moka::future::Cache<String, Bitmap>,
    stats: Arc<CacheStatsTracker>,
    max_item_size_bytes: u64,
}

impl MemoryCache {
    /// Create a new MemoryCache from configuration
    pub fn new(config: &MemoryCacheConfig) -> Self {
        // Create stats tracker first so we can share it with the eviction listener
        let stats = Arc::new(CacheStatsTracker::new());
        let stats_clone = stats.clone();

        let cache = moka::future::Cache::builder()
            .max_capacity(config.max_cache_size_bytes())
            .time_to_live(config.ttl())
            .weigher(|_key, bitmap: &Bitmap| {
                u32::try_from(bitmap.byte_size()).unwrap_or(u32::MAX)
            })
            .eviction_listener(move |_key, _value, cause| {
                use moka::notification::RemovalCause;
                if matches!(cause, RemovalCause::Size | RemovalCause::Expired) {
                    stats_clone.increment_evictions();
                }
            })
            .build();

        Self {
            cache,
            stats,
            max_item_size_bytes: config.max_item_size_bytes(),
        }
    }

    /// Look up a bitmap. Recycled or zero-sized bitmaps count as a miss.
    pub async fn get(&self, key: &str) -> Option<Bitmap> {
        match self.cache.get(key).await {
            Some(bitmap) if bitmap.is_valid() => {
                self.stats.increment_hits();
                Some(bitmap)
            }
            _ => {
                self.stats.increment_misses();
                None
            }
        }
    }

    /// Insert or overwrite a bitmap
    /// Returns error if the bitmap exceeds max_item_size
    pub async fn put(&self, key: String, bitmap: Bitmap) -> Result<(), CacheError> {
        let size = bitmap.byte_size() as u64;
        if size > self.max_item_size_bytes {
            return Err(CacheError::ItemTooLarge {
                size,
                max: self.max_item_size_bytes,
            });
        }

        self.cache.insert(key, bitmap).await;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Option<Bitmap> {
        self.cache.remove(key).await
    }

    /// Drop every entry and wait for moka to apply the invalidation
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    /// Get current entry count (approximate due to eventual consistency)
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;
        self.stats
            .snapshot(self.cache.weighted_size(), self.cache.entry_count())
    }
}
