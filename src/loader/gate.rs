//! Pause gate
//!
//! Shared between the loader and every load task. While paused, tasks wait at
//! admission; `resume` releases all of them at once through the watch channel.
//! No order is guaranteed among tasks released by the same resume.

use tokio::sync::watch;

/// The watch value is the only record of the paused state
#[derive(Debug)]
pub struct PauseGate {
    signal: watch::Sender<bool>,
}

impl PauseGate {
    pub fn new() -> Self {
        let (signal, _rx) = watch::channel(false);
        Self { signal }
    }

    pub fn is_paused(&self) -> bool {
        *self.signal.borrow()
    }

    pub fn pause(&self) {
        self.signal.send_replace(true);
        tracing::debug!("Image loading paused");
    }

    /// Reopen the gate and wake every waiting task
    pub fn resume(&self) {
        self.signal.send_replace(false);
        tracing::debug!("Image loading resumed");
    }

    /// Return once the gate is open. Returns immediately when not paused.
    pub async fn wait_until_open(&self) {
        let mut rx = self.signal.subscribe();
        // The sender lives as long as `self`, so this only ends on an open gate
        let _ = rx.wait_for(|paused| !*paused).await;
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}
