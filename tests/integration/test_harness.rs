// Shared fixtures for loader integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use parking_lot::Mutex;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;
use tsubame::cache::{DiskCache, ImageCache, MemoryCache};
use tsubame::config::{DiskCacheConfig, LoaderConfig, MemoryCacheConfig};
use tsubame::decoder::{ImageDecoder, RasterDecoder};
use tsubame::loader::{DisplayTarget, ImageLoadingListener, TargetHandle, UiQueue};
use tsubame::transport::{RequestData, ResponseData, Transport, TransportError};
use tsubame::{Bitmap, ImageLoader, LoadError};

/// Encode a solid `width`x`height` PNG
pub fn png_bytes(width: u32, height: u32) -> Bytes {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([200, 40, 40, 255]),
    ));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageOutputFormat::Png)
        .expect("Failed to encode PNG");
    Bytes::from(out.into_inner())
}

/// Surface that counts how often it was painted
#[derive(Default)]
pub struct Surface {
    painted: AtomicUsize,
    last: Mutex<Option<(u32, u32)>>,
}

impl Surface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn painted(&self) -> usize {
        self.painted.load(Ordering::SeqCst)
    }

    pub fn last_size(&self) -> Option<(u32, u32)> {
        *self.last.lock()
    }
}

impl DisplayTarget for Surface {
    fn set_bitmap(&self, bitmap: &Bitmap) {
        self.painted.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Some((bitmap.width(), bitmap.height()));
    }
}

pub fn as_target(surface: &Arc<Surface>) -> Arc<dyn DisplayTarget> {
    surface.clone()
}

/// Records every callback as a short label
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn push(&self, label: impl Into<String>) {
        self.events.lock().push(label.into());
    }
}

pub fn failure_label(cause: &Option<LoadError>) -> &'static str {
    match cause {
        Some(LoadError::Connection(_)) => "failure:connection",
        Some(LoadError::Io(_)) => "failure:io",
        Some(LoadError::Decode(_)) => "failure:decode",
        Some(LoadError::OutOfMemory(_)) => "failure:oom",
        Some(LoadError::IllegalState(_)) => "failure:illegal_state",
        Some(LoadError::Cache(_)) => "failure:cache",
        Some(LoadError::Uncategorized(_)) => "failure:uncategorized",
        None => "failure:none",
    }
}

impl ImageLoadingListener for Recorder {
    fn on_started(&self, _uri: &str, _target: &TargetHandle) {
        self.push("started");
    }

    fn on_success(&self, _uri: &str, _target: &TargetHandle, _bitmap: &Bitmap) {
        self.push("success");
    }

    fn on_failure(&self, _uri: &str, _target: &TargetHandle, cause: Option<LoadError>) {
        self.push(failure_label(&cause));
    }

    fn on_cancelled(&self, _uri: &str, _target: &TargetHandle) {
        self.push("cancelled");
    }
}

/// Serves one fixed body for every uri and counts fetches
pub struct CountingTransport {
    body: Bytes,
    delay: Duration,
    calls: AtomicUsize,
}

impl CountingTransport {
    pub fn new(body: Bytes) -> Arc<Self> {
        Self::with_delay(body, Duration::ZERO)
    }

    pub fn with_delay(body: Bytes, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            body,
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn fetch(&self, _request: &RequestData) -> Result<ResponseData, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(ResponseData::from_bytes(self.body.clone()))
    }
}

/// Holds fetches of one uri until [`GatedTransport::open`] is called
pub struct GatedTransport {
    gated_uri: String,
    body: Bytes,
    gate: watch::Sender<bool>,
    entered: AtomicUsize,
}

impl GatedTransport {
    pub fn new(gated_uri: &str, body: Bytes) -> Arc<Self> {
        let (gate, _) = watch::channel(false);
        Arc::new(Self {
            gated_uri: gated_uri.to_string(),
            body,
            gate,
            entered: AtomicUsize::new(0),
        })
    }

    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    /// Fetches of the gated uri so far
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    /// Wait until a fetch for the gated uri is parked at the gate
    pub async fn wait_entered(&self) {
        while self.entered.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn fetch(&self, request: &RequestData) -> Result<ResponseData, TransportError> {
        if request.uri == self.gated_uri {
            let mut rx = self.gate.subscribe();
            self.entered.fetch_add(1, Ordering::SeqCst);
            let _ = rx.wait_for(|open| *open).await;
        }
        Ok(ResponseData::from_bytes(self.body.clone()))
    }
}

/// Loader wired to a temp disk cache and an in-process UI queue
pub struct TestLoader {
    pub dir: TempDir,
    pub loader: ImageLoader,
    pub queue: UiQueue,
}

impl TestLoader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_decoder(transport, Arc::new(RasterDecoder::default()))
    }

    pub fn with_decoder(transport: Arc<dyn Transport>, decoder: Arc<dyn ImageDecoder>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = LoaderConfig::default();
        let cache = ImageCache::new(
            MemoryCache::new(&MemoryCacheConfig::default()),
            DiskCache::new(&DiskCacheConfig {
                cache_dir: dir.path().to_path_buf(),
            }),
        );
        let (dispatcher, queue) = UiQueue::channel();
        let loader = ImageLoader::builder(&config)
            .with_cache(cache)
            .with_transport(transport)
            .with_decoder(decoder)
            .build(tokio::runtime::Handle::current(), Arc::new(dispatcher))
            .expect("Failed to build loader");
        Self { dir, loader, queue }
    }
}
