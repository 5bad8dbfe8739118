//! Image loader
//!
//! [`ImageLoader`] is the entry point. It owns the state every load task
//! shares ([`LoadContext`]), binds each request to its display target and
//! spawns a [`LoadTask`] on the injected runtime.
//!
//! # Example
//!
//! ```ignore
//! let (dispatcher, mut ui_queue) = UiQueue::channel();
//! let loader = ImageLoader::new(&config, runtime.handle().clone(), Arc::new(dispatcher))?;
//!
//! loader.display_image("https://example.com/a.png", &view, ImageSize::new(200, 200), listener);
//!
//! // on the UI thread
//! while ui_queue.blocking_run_next() {}
//! ```

mod dispatcher;
mod display;
mod gate;
mod interrupt;
mod liveness;
mod locks;
mod request;
mod task;

pub use dispatcher::{Dispatcher, UiDispatcher, UiJob, UiQueue};
pub use gate::PauseGate;
pub use interrupt::Interrupt;
pub use liveness::{DisplayTarget, LivenessTracker, TargetHandle, TargetId};
pub use locks::{UriLock, UriLockRegistry};
pub use request::{ImageInfo, ImageLoadingListener, NoopListener};
pub use task::LoadTask;

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::cache::{memory_cache_key, CacheError, ImageCache, ImageCacheStats};
use crate::config::LoaderConfig;
use crate::decoder::{ImageDecoder, ImageSize, RasterDecoder};
use crate::error::LoadError;
use crate::transport::{DefaultTransport, Transport, TransportError};

/// State shared by the loader and all of its tasks
pub struct LoadContext {
    pub(crate) cache: ImageCache,
    pub(crate) tracker: LivenessTracker,
    pub(crate) gate: PauseGate,
    pub(crate) locks: UriLockRegistry,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) decoder: Arc<dyn ImageDecoder>,
    pub(crate) dispatcher: Arc<dyn Dispatcher>,
}

/// Handle to one submitted load
pub struct LoadHandle {
    interrupt: Interrupt,
    join: Option<JoinHandle<()>>,
}

impl LoadHandle {
    /// Ask the task to stop at its next checkpoint. An interrupted task fires
    /// no callbacks.
    pub fn cancel(&self) {
        self.interrupt.interrupt();
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait until the task's run has returned
    pub async fn join(self) {
        if let Some(join) = self.join {
            if let Err(e) = join.await {
                tracing::warn!(error = %e, "Load task did not complete");
            }
        }
    }
}

/// Builder for [`ImageLoader`] with injectable collaborators
pub struct ImageLoaderBuilder {
    config: LoaderConfig,
    cache: Option<ImageCache>,
    transport: Option<Arc<dyn Transport>>,
    decoder: Option<Arc<dyn ImageDecoder>>,
}

impl ImageLoaderBuilder {
    pub fn with_cache(mut self, cache: ImageCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Build the loader. Load tasks run on `runtime`; callbacks are posted
    /// through `dispatcher`.
    ///
    /// # Errors
    ///
    /// Returns an error if the default HTTP transport cannot be created.
    pub fn build(
        self,
        runtime: Handle,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<ImageLoader, TransportError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(DefaultTransport::new(&self.config.network)?),
        };
        let decoder = self
            .decoder
            .unwrap_or_else(|| Arc::new(RasterDecoder::new(&self.config.decoder)));
        let cache = self
            .cache
            .unwrap_or_else(|| ImageCache::from_config(&self.config));

        let ctx = LoadContext {
            cache,
            tracker: LivenessTracker::new(self.config.liveness.tracker_prune_threshold),
            gate: PauseGate::new(),
            locks: UriLockRegistry::new(self.config.liveness.lock_prune_threshold),
            transport,
            decoder,
            dispatcher,
        };

        Ok(ImageLoader {
            ctx: Arc::new(ctx),
            runtime,
        })
    }
}

/// Asynchronous image loader
pub struct ImageLoader {
    ctx: Arc<LoadContext>,
    runtime: Handle,
}

impl ImageLoader {
    /// Loader with the default cache, transport and decoder for `config`
    pub fn new(
        config: &LoaderConfig,
        runtime: Handle,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<Self, TransportError> {
        Self::builder(config).build(runtime, dispatcher)
    }

    pub fn builder(config: &LoaderConfig) -> ImageLoaderBuilder {
        ImageLoaderBuilder {
            config: config.clone(),
            cache: None,
            transport: None,
            decoder: None,
        }
    }

    /// Load `uri` into `target` at `size`.
    ///
    /// Must be called from the UI context: the target is rebound here, before
    /// any work starts, and `on_started` fires synchronously. Every later
    /// callback arrives through the dispatcher.
    pub fn display_image(
        &self,
        uri: &str,
        target: &Arc<dyn DisplayTarget>,
        size: ImageSize,
        listener: Arc<dyn ImageLoadingListener>,
    ) -> LoadHandle {
        let handle = TargetHandle::new(target);
        let interrupt = Interrupt::new();

        if uri.is_empty() {
            self.ctx.tracker.unbind(&handle);
            listener.on_started(uri, &handle);
            self.ctx.dispatcher.post(Box::new(move || {
                listener.on_failure(
                    "",
                    &handle,
                    Some(LoadError::IllegalState("empty image uri".to_string())),
                );
            }));
            return LoadHandle {
                interrupt,
                join: None,
            };
        }

        let key = memory_cache_key(uri, size);
        self.ctx.tracker.bind(&handle, &key);
        listener.on_started(uri, &handle);

        let info = ImageInfo {
            uri: uri.to_string(),
            memory_cache_key: key,
            image_size: size,
            target: handle,
            listener,
            load_from_uri_lock: self.ctx.locks.lock_for(uri),
        };

        let span = tracing::debug_span!("load_image", uri = %info.uri, key = %info.memory_cache_key);
        let task = LoadTask::new(self.ctx.clone(), info, interrupt.clone());
        let join = self.runtime.spawn(task.run().instrument(span));

        LoadHandle {
            interrupt,
            join: Some(join),
        }
    }

    /// Detach `target` from its pending request. The request becomes stale
    /// and finishes without callbacks.
    pub fn cancel_display(&self, target: &Arc<dyn DisplayTarget>) {
        self.ctx.tracker.unbind(&TargetHandle::new(target));
    }

    /// Memory cache key `target` is currently waiting for
    pub fn loading_key_for(&self, target: &Arc<dyn DisplayTarget>) -> Option<String> {
        self.ctx.tracker.current_key_for(&TargetHandle::new(target))
    }

    /// Hold new and queued tasks at admission (e.g. during a fling)
    pub fn pause(&self) {
        self.ctx.gate.pause();
    }

    /// Release every task held at admission
    pub fn resume(&self) {
        self.ctx.gate.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.ctx.gate.is_paused()
    }

    pub fn cache(&self) -> &ImageCache {
        &self.ctx.cache
    }

    pub async fn clear_memory_cache(&self) {
        self.ctx.cache.clear_memory().await;
    }

    pub async fn clear_disk_cache(&self) -> Result<(), CacheError> {
        self.ctx.cache.clear_disk().await
    }

    pub async fn stats(&self) -> ImageCacheStats {
        self.ctx.cache.stats().await
    }
}
