// Configuration module
//
// `LoaderConfig` is read from YAML. `${VAR_NAME}` references are replaced with
// environment variable values before parsing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_DECODER_MAX_ALLOC_MB, DEFAULT_DISK_CACHE_DIR,
    DEFAULT_LOCK_PRUNE_THRESHOLD, DEFAULT_MAX_BITMAP_SIZE_MB, DEFAULT_MEMORY_CACHE_SIZE_MB,
    DEFAULT_MEMORY_TTL_SECS, DEFAULT_READ_TIMEOUT_SECS, DEFAULT_TRACKER_PRUNE_THRESHOLD,
    DEFAULT_USER_AGENT, DEFAULT_WORKER_THREADS,
};

/// Top-level loader configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default)]
    pub memory: MemoryCacheConfig,
    #[serde(default)]
    pub disk: DiskCacheConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub liveness: LivenessConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LoaderConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.memory.validate()?;
        self.disk.validate()?;
        self.network.validate()?;
        self.decoder.validate()?;
        self.executor.validate()?;
        self.liveness.validate()?;
        Ok(())
    }
}

/// Memory (decoded bitmap) cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    #[serde(default = "default_memory_cache_size_mb")]
    pub max_cache_size_mb: u64,
    #[serde(default = "default_max_bitmap_size_mb")]
    pub max_item_size_mb: u64,
    #[serde(default = "default_memory_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size_mb: default_memory_cache_size_mb(),
            max_item_size_mb: default_max_bitmap_size_mb(),
            ttl_seconds: default_memory_ttl_seconds(),
        }
    }
}

fn default_memory_cache_size_mb() -> u64 {
    DEFAULT_MEMORY_CACHE_SIZE_MB
}

fn default_max_bitmap_size_mb() -> u64 {
    DEFAULT_MAX_BITMAP_SIZE_MB
}

fn default_memory_ttl_seconds() -> u64 {
    DEFAULT_MEMORY_TTL_SECS
}

impl MemoryCacheConfig {
    /// Convert max_cache_size_mb to bytes
    pub fn max_cache_size_bytes(&self) -> u64 {
        self.max_cache_size_mb * 1024 * 1024
    }

    /// Convert max_item_size_mb to bytes
    pub fn max_item_size_bytes(&self) -> u64 {
        self.max_item_size_mb * 1024 * 1024
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_cache_size_mb == 0 {
            return Err("memory.max_cache_size_mb must be greater than 0".to_string());
        }
        if self.max_item_size_mb > self.max_cache_size_mb {
            return Err(format!(
                "memory.max_item_size_mb ({}) cannot exceed memory.max_cache_size_mb ({})",
                self.max_item_size_mb, self.max_cache_size_mb
            ));
        }
        if self.ttl_seconds == 0 {
            return Err("memory.ttl_seconds must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Disk (raw blob) cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskCacheConfig {
    #[serde(default = "default_disk_cache_dir")]
    pub cache_dir: PathBuf,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_disk_cache_dir(),
        }
    }
}

fn default_disk_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DISK_CACHE_DIR)
}

impl DiskCacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err("disk.cache_dir cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_read_timeout_secs() -> u64 {
    DEFAULT_READ_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.connect_timeout_secs == 0 {
            return Err("network.connect_timeout_secs must be greater than 0".to_string());
        }
        if self.read_timeout_secs < self.connect_timeout_secs {
            return Err(format!(
                "network.read_timeout_secs ({}) must be >= network.connect_timeout_secs ({})",
                self.read_timeout_secs, self.connect_timeout_secs
            ));
        }
        Ok(())
    }
}

/// Decoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    #[serde(default = "default_decoder_max_alloc_mb")]
    pub max_alloc_mb: u64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_alloc_mb: default_decoder_max_alloc_mb(),
        }
    }
}

fn default_decoder_max_alloc_mb() -> u64 {
    DEFAULT_DECODER_MAX_ALLOC_MB
}

impl DecoderConfig {
    pub fn max_alloc_bytes(&self) -> u64 {
        self.max_alloc_mb * 1024 * 1024
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_alloc_mb == 0 {
            return Err("decoder.max_alloc_mb must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Worker runtime configuration (used by the binary to size its runtime)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
        }
    }
}

fn default_worker_threads() -> usize {
    DEFAULT_WORKER_THREADS
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_threads == 0 {
            return Err("executor.worker_threads must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Bookkeeping thresholds for the liveness tracker and the lock registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessConfig {
    #[serde(default = "default_tracker_prune_threshold")]
    pub tracker_prune_threshold: usize,
    #[serde(default = "default_lock_prune_threshold")]
    pub lock_prune_threshold: usize,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            tracker_prune_threshold: default_tracker_prune_threshold(),
            lock_prune_threshold: default_lock_prune_threshold(),
        }
    }
}

fn default_tracker_prune_threshold() -> usize {
    DEFAULT_TRACKER_PRUNE_THRESHOLD
}

fn default_lock_prune_threshold() -> usize {
    DEFAULT_LOCK_PRUNE_THRESHOLD
}

impl LivenessConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tracker_prune_threshold == 0 || self.lock_prune_threshold == 0 {
            return Err("liveness prune thresholds must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Default filter directive, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
