//! Display step, run on the UI context after a successful load

use std::sync::Arc;

use super::request::ImageInfo;
use super::LoadContext;
use crate::decoder::Bitmap;

/// Hands a loaded bitmap to its target if the target still wants it
pub(crate) struct DisplayTask {
    bitmap: Bitmap,
    info: ImageInfo,
    ctx: Arc<LoadContext>,
}

impl DisplayTask {
    pub(crate) fn new(bitmap: Bitmap, info: ImageInfo, ctx: Arc<LoadContext>) -> Self {
        Self { bitmap, info, ctx }
    }

    pub(crate) fn run(self) {
        let ImageInfo {
            uri,
            memory_cache_key,
            target,
            listener,
            ..
        } = &self.info;

        // The target may have been recycled between dispatch and now
        if self.ctx.tracker.is_stale(target, memory_cache_key) {
            tracing::debug!(key = %memory_cache_key, "Target reused before display");
            listener.on_cancelled(uri, target);
            return;
        }

        let Some(surface) = target.surface() else {
            listener.on_cancelled(uri, target);
            return;
        };

        surface.set_bitmap(&self.bitmap);
        tracing::debug!(key = %memory_cache_key, "Image displayed");
        listener.on_success(uri, target, &self.bitmap);
    }
}
