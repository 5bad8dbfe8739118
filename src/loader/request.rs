//! Load request and listener callbacks

use std::sync::Arc;

use super::liveness::TargetHandle;
use super::locks::UriLock;
use crate::decoder::{Bitmap, ImageSize};
use crate::error::LoadError;

/// Callbacks for one load. All of them run on the UI context.
///
/// At most one of `on_success`, `on_failure` and `on_cancelled` fires per
/// request; a request dropped because its target went stale fires none.
pub trait ImageLoadingListener: Send + Sync {
    fn on_started(&self, _uri: &str, _target: &TargetHandle) {}

    fn on_success(&self, _uri: &str, _target: &TargetHandle, _bitmap: &Bitmap) {}

    /// `cause` is `None` when the decode produced an unusable bitmap rather
    /// than an error
    fn on_failure(&self, _uri: &str, _target: &TargetHandle, _cause: Option<LoadError>) {}

    fn on_cancelled(&self, _uri: &str, _target: &TargetHandle) {}
}

/// Listener that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl ImageLoadingListener for NoopListener {}

/// Everything a load task needs to know about its request. Immutable once
/// built.
#[derive(Clone)]
pub struct ImageInfo {
    pub uri: String,
    pub memory_cache_key: String,
    pub image_size: ImageSize,
    pub target: TargetHandle,
    pub listener: Arc<dyn ImageLoadingListener>,
    pub load_from_uri_lock: Arc<UriLock>,
}

impl std::fmt::Debug for ImageInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageInfo")
            .field("uri", &self.uri)
            .field("memory_cache_key", &self.memory_cache_key)
            .field("image_size", &self.image_size)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
