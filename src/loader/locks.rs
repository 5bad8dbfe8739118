//! Per-uri exclusion
//!
//! Every in-flight request for the same uri shares one [`UriLock`], so only
//! one task at a time runs the disk/network/decode section for that uri. The
//! registry keeps weak references only: a lock lives exactly as long as some
//! request holds it, and dead entries are swept once the map passes its
//! threshold.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Lock guarding the load-from-uri section
pub type UriLock = tokio::sync::Mutex<()>;

struct Registry {
    locks: HashMap<String, Weak<UriLock>>,
    /// Size at which the next sweep runs. Never below the configured threshold.
    next_prune: usize,
    sweeps: usize,
}

pub struct UriLockRegistry {
    inner: Mutex<Registry>,
    prune_threshold: usize,
}

impl UriLockRegistry {
    pub fn new(prune_threshold: usize) -> Self {
        Self {
            inner: Mutex::new(Registry {
                locks: HashMap::new(),
                next_prune: prune_threshold,
                sweeps: 0,
            }),
            prune_threshold,
        }
    }

    /// Lock shared by every live request for `uri`
    pub fn lock_for(&self, uri: &str) -> Arc<UriLock> {
        let mut inner = self.inner.lock();
        if let Some(lock) = inner.locks.get(uri).and_then(Weak::upgrade) {
            return lock;
        }

        if inner.locks.len() >= inner.next_prune {
            inner.locks.retain(|_, lock| lock.strong_count() > 0);
            // Live entries survive a sweep; wait for the map to double before the next one
            inner.next_prune = self.prune_threshold.max(inner.locks.len() * 2);
            inner.sweeps += 1;
            tracing::trace!(
                live = inner.locks.len(),
                sweeps = inner.sweeps,
                "Swept uri lock registry"
            );
        }

        let lock = Arc::new(UriLock::new(()));
        inner.locks.insert(uri.to_string(), Arc::downgrade(&lock));
        lock
    }

    /// Number of registry entries, including not-yet-swept dead ones
    pub fn len(&self) -> usize {
        self.inner.lock().locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
