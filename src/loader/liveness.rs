//! Target liveness tracking
//!
//! A display surface belongs to the UI. The loader only ever holds a weak
//! [`TargetHandle`] to it, and the [`LivenessTracker`] remembers which memory
//! cache key each surface currently expects. A request is stale once its
//! surface is gone or has been rebound to a different key (view recycling).

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::decoder::Bitmap;

/// A UI surface that can show a bitmap
pub trait DisplayTarget: Send + Sync {
    /// Called on the UI context once a load for this surface succeeds
    fn set_bitmap(&self, bitmap: &Bitmap);
}

/// Identity of a surface allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(usize);

/// Weak reference to a display surface
#[derive(Clone)]
pub struct TargetHandle {
    id: TargetId,
    surface: Weak<dyn DisplayTarget>,
}

impl TargetHandle {
    /// Wrap a surface. Wrapping the same surface twice yields equal ids.
    pub fn new(surface: &Arc<dyn DisplayTarget>) -> Self {
        Self {
            id: TargetId(Arc::as_ptr(surface) as *const () as usize),
            surface: Arc::downgrade(surface),
        }
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    /// True once every strong reference to the surface has been dropped
    pub fn is_collected(&self) -> bool {
        self.surface.strong_count() == 0
    }

    /// Borrow the surface if it is still alive
    pub fn surface(&self) -> Option<Arc<dyn DisplayTarget>> {
        self.surface.upgrade()
    }
}

impl fmt::Debug for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetHandle")
            .field("id", &self.id)
            .field("collected", &self.is_collected())
            .finish()
    }
}

struct Binding {
    surface: Weak<dyn DisplayTarget>,
    key: String,
}

struct Bindings {
    map: HashMap<TargetId, Binding>,
    /// Size at which the next sweep runs. Never below the configured threshold.
    next_prune: usize,
}

/// Maps each bound surface to the key of its most recent request
pub struct LivenessTracker {
    bindings: RwLock<Bindings>,
    prune_threshold: usize,
}

impl LivenessTracker {
    pub fn new(prune_threshold: usize) -> Self {
        Self {
            bindings: RwLock::new(Bindings {
                map: HashMap::new(),
                next_prune: prune_threshold,
            }),
            prune_threshold,
        }
    }

    /// Record that `target` now expects `key`, replacing any earlier binding
    pub fn bind(&self, target: &TargetHandle, key: &str) {
        let mut bindings = self.bindings.write();
        if bindings.map.len() >= bindings.next_prune {
            let before = bindings.map.len();
            bindings
                .map
                .retain(|_, binding| binding.surface.strong_count() > 0);
            bindings.next_prune = self.prune_threshold.max(bindings.map.len() * 2);
            tracing::trace!(
                pruned = before - bindings.map.len(),
                next_prune = bindings.next_prune,
                "Pruned collected targets"
            );
        }
        bindings.map.insert(
            target.id,
            Binding {
                surface: target.surface.clone(),
                key: key.to_string(),
            },
        );
    }

    /// Forget the binding for `target`
    pub fn unbind(&self, target: &TargetHandle) {
        self.bindings.write().map.remove(&target.id);
    }

    pub fn is_collected(&self, target: &TargetHandle) -> bool {
        target.is_collected()
    }

    pub fn current_key_for(&self, target: &TargetHandle) -> Option<String> {
        self.bindings
            .read()
            .map
            .get(&target.id)
            .map(|binding| binding.key.clone())
    }

    /// True if `target` is gone or no longer expects `key`
    pub fn is_stale(&self, target: &TargetHandle, key: &str) -> bool {
        if self.is_collected(target) {
            return true;
        }
        match self.bindings.read().map.get(&target.id) {
            Some(binding) => binding.key != key,
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
