//! UI-affinity dispatch
//!
//! Terminal callbacks must run on the single context that owns the UI. Load
//! tasks never call listeners directly; they post a [`UiJob`] through a
//! [`Dispatcher`] and the UI context runs it later.

use std::time::Duration;
use tokio::sync::mpsc;

/// Work to run on the UI context
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Posts work onto the UI context
pub trait Dispatcher: Send + Sync {
    /// Queue `job`. It must not run on the calling thread before `post` returns.
    fn post(&self, job: UiJob);
}

/// Sending half of a channel-backed UI queue
#[derive(Clone)]
pub struct UiDispatcher {
    tx: mpsc::UnboundedSender<UiJob>,
}

impl Dispatcher for UiDispatcher {
    fn post(&self, job: UiJob) {
        if self.tx.send(job).is_err() {
            tracing::debug!("UI queue closed, dropping job");
        }
    }
}

/// Receiving half, owned and drained by the UI thread
pub struct UiQueue {
    rx: mpsc::UnboundedReceiver<UiJob>,
}

impl UiQueue {
    /// Create a connected dispatcher/queue pair
    pub fn channel() -> (UiDispatcher, UiQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (UiDispatcher { tx }, UiQueue { rx })
    }

    /// Run every job queued so far without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Wait for the next job and run it. Returns false once every dispatcher
    /// has been dropped and the queue is drained.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Like [`UiQueue::run_next`] with a deadline. Returns false on timeout or
    /// closed queue.
    pub async fn run_next_timeout(&mut self, timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(timeout, self.run_next()).await,
            Ok(true)
        )
    }

    /// Blocking variant for a dedicated (non-async) UI thread
    pub fn blocking_run_next(&mut self) -> bool {
        match self.rx.blocking_recv() {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }
}
