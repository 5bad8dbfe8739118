//! Utility functions for disk cache

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::constants::{DISK_BLOB_EXTENSION, DISK_ENTRIES_DIR};

/// Convert a uri to a SHA256 hash for use as a filename
pub fn uri_to_hash(uri: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(uri.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Directory holding blob files
pub fn entries_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join(DISK_ENTRIES_DIR)
}

/// Blob path for a uri
pub fn blob_path(cache_dir: &Path, uri: &str) -> PathBuf {
    entries_dir(cache_dir).join(format!("{}.{}", uri_to_hash(uri), DISK_BLOB_EXTENSION))
}

/// Unique sibling temp path so concurrent writers never share a file
pub fn temp_path(path: &Path) -> PathBuf {
    path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()))
}
