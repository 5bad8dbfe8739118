use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tsubame::config::LoaderConfig;
use tsubame::loader::{DisplayTarget, ImageLoadingListener, TargetHandle, UiQueue};
use tsubame::{Bitmap, ImageLoader, ImageSize, LoadError};

/// Tsubame - load images through the memory/disk/network pipeline
#[derive(Parser, Debug)]
#[command(name = "tsubame")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target width used as decode hint and memory cache key
    #[arg(long, default_value_t = 256)]
    width: u32,

    /// Target height used as decode hint and memory cache key
    #[arg(long, default_value_t = 256)]
    height: u32,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Image uris (http://, https://, file:// or absolute paths)
    #[arg(required = true)]
    uris: Vec<String>,
}

/// Surface that only remembers the size of what it was given
#[derive(Default)]
struct HeadlessSurface {
    shown: parking_lot::Mutex<Option<(u32, u32)>>,
}

impl DisplayTarget for HeadlessSurface {
    fn set_bitmap(&self, bitmap: &Bitmap) {
        *self.shown.lock() = Some((bitmap.width(), bitmap.height()));
    }
}

#[derive(Default)]
struct ReportListener {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl ImageLoadingListener for ReportListener {
    fn on_success(&self, uri: &str, _target: &TargetHandle, bitmap: &Bitmap) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            uri = %uri,
            width = bitmap.width(),
            height = bitmap.height(),
            "Loaded"
        );
    }

    fn on_failure(&self, uri: &str, _target: &TargetHandle, cause: Option<LoadError>) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        match cause {
            Some(e) => tracing::error!(uri = %uri, error = %e, "Failed"),
            None => tracing::error!(uri = %uri, "Failed: unusable image"),
        }
    }

    fn on_cancelled(&self, uri: &str, _target: &TargetHandle) {
        tracing::warn!(uri = %uri, "Cancelled");
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => LoaderConfig::from_file(path).map_err(anyhow::Error::msg)?,
        None => LoaderConfig::default(),
    };
    config.validate().map_err(anyhow::Error::msg)?;

    tsubame::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    tracing::info!(
        cache_dir = %config.disk.cache_dir.display(),
        memory_mb = config.memory.max_cache_size_mb,
        worker_threads = config.executor.worker_threads,
        images = args.uris.len(),
        "Configuration loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.executor.worker_threads)
        .thread_name("tsubame-worker")
        .enable_all()
        .build()
        .context("Failed to build worker runtime")?;

    // This thread plays the UI role: it owns the queue and runs every callback
    let (dispatcher, mut ui_queue) = UiQueue::channel();
    let loader = ImageLoader::new(&config, runtime.handle().clone(), Arc::new(dispatcher))
        .context("Failed to create image loader")?;

    let size = ImageSize::new(args.width, args.height);
    let listener = Arc::new(ReportListener::default());
    let surfaces: Vec<Arc<HeadlessSurface>> = args
        .uris
        .iter()
        .map(|_| Arc::new(HeadlessSurface::default()))
        .collect();

    let handles: Vec<_> = args
        .uris
        .iter()
        .zip(&surfaces)
        .map(|(uri, surface)| {
            let target: Arc<dyn DisplayTarget> = surface.clone();
            loader.display_image(uri, &target, size, listener.clone())
        })
        .collect();

    let deadline = Instant::now() + Duration::from_secs(args.timeout_secs);
    loop {
        runtime.block_on(ui_queue.run_next_timeout(Duration::from_millis(100)));
        if handles.iter().all(|h| h.is_finished()) {
            ui_queue.run_pending();
            break;
        }
        if Instant::now() >= deadline {
            tracing::error!("Timed out waiting for images");
            handles.iter().for_each(|h| h.cancel());
            break;
        }
    }

    for (uri, surface) in args.uris.iter().zip(&surfaces) {
        if let Some((width, height)) = *surface.shown.lock() {
            println!("{}\t{}x{}", uri, width, height);
        }
    }

    let stats = runtime.block_on(loader.stats());
    tracing::info!(
        succeeded = listener.succeeded.load(Ordering::SeqCst),
        failed = listener.failed.load(Ordering::SeqCst),
        memory_hits = stats.memory.hits,
        disk_hits = stats.disk.hits,
        disk_bytes = stats.disk.current_size_bytes,
        "Done"
    );

    if listener.failed.load(Ordering::SeqCst) > 0 {
        std::process::exit(1);
    }
    Ok(())
}
