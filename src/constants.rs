// Constants module - centralized default values for configuration
//
// Every default used by `LoaderConfig` lives here so the YAML defaults and the
// programmatic defaults cannot drift apart.

// =============================================================================
// Memory cache defaults
// =============================================================================

/// Default memory cache capacity (64 MB of decoded pixels)
pub const DEFAULT_MEMORY_CACHE_SIZE_MB: u64 = 64;

/// Default maximum size of a single decoded bitmap (16 MB)
pub const DEFAULT_MAX_BITMAP_SIZE_MB: u64 = 16;

/// Default time-to-live for decoded bitmaps (10 minutes)
pub const DEFAULT_MEMORY_TTL_SECS: u64 = 600;

// =============================================================================
// Disk cache defaults
// =============================================================================

/// Default directory for persisted image blobs
pub const DEFAULT_DISK_CACHE_DIR: &str = "/tmp/tsubame/cache";

/// Sub-directory holding blob files inside the cache directory
pub const DISK_ENTRIES_DIR: &str = "entries";

/// Extension of persisted blob files
pub const DISK_BLOB_EXTENSION: &str = "data";

// =============================================================================
// Network defaults
// =============================================================================

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default total request timeout in seconds
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 20;

/// Default User-Agent header sent with image requests
pub const DEFAULT_USER_AGENT: &str = concat!("tsubame/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Decoder defaults
// =============================================================================

/// Default allocation ceiling for a single decode (128 MB)
pub const DEFAULT_DECODER_MAX_ALLOC_MB: u64 = 128;

// =============================================================================
// Executor and bookkeeping defaults
// =============================================================================

/// Default number of worker threads for the loader runtime
pub const DEFAULT_WORKER_THREADS: usize = 3;

/// Liveness tracker size at which collected targets are pruned
pub const DEFAULT_TRACKER_PRUNE_THRESHOLD: usize = 256;

/// Lock registry size at which idle per-uri locks are pruned
pub const DEFAULT_LOCK_PRUNE_THRESHOLD: usize = 128;
