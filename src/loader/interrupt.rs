//! Cooperative interruption of a single load task

use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable interrupt flag. The task observes it at its checkpoints and while
/// waiting at the pause gate; nothing is forcibly aborted.
#[derive(Debug, Clone)]
pub struct Interrupt {
    flag: Arc<watch::Sender<bool>>,
}

impl Interrupt {
    pub fn new() -> Self {
        let (flag, _rx) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    pub fn interrupt(&self) {
        self.flag.send_replace(true);
    }

    pub fn is_interrupted(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolve once `interrupt` has been called
    pub async fn interrupted(&self) {
        let mut rx = self.flag.subscribe();
        let _ = rx.wait_for(|set| *set).await;
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}
