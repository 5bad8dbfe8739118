//! Load task
//!
//! One task per request. It runs on a worker of the loader runtime and walks:
//! pause gate → per-uri lock → memory cache → disk cache → transport → disk
//! cache → decoder → memory cache, re-checking target liveness after every
//! step that can block. The outcome is posted to the UI dispatcher as a
//! display task, a failure, or a cancellation; a task whose target went
//! stale (or that was interrupted) posts nothing.

use std::sync::Arc;

use super::display::DisplayTask;
use super::interrupt::Interrupt;
use super::request::ImageInfo;
use super::LoadContext;
use crate::decoder::{Bitmap, ImageSource};
use crate::error::LoadError;
use crate::transport::RequestData;

/// Why a task stopped before producing a bitmap
#[derive(Debug)]
enum TaskError {
    /// Target collected or rebound, or the task was interrupted. Silent.
    NotActual,
    /// Categorised failure; `None` for an unusable decode result
    Failed(Option<LoadError>),
    /// Aborted inside the lock scope for a reason outside the failure taxonomy
    Aborted(String),
}

pub struct LoadTask {
    ctx: Arc<LoadContext>,
    info: ImageInfo,
    interrupt: Interrupt,
}

impl LoadTask {
    pub fn new(ctx: Arc<LoadContext>, info: ImageInfo, interrupt: Interrupt) -> Self {
        Self {
            ctx,
            info,
            interrupt,
        }
    }

    pub async fn run(self) {
        if self.wait_if_paused().await {
            tracing::debug!(key = %self.info.memory_cache_key, "Task not actual at admission");
            return;
        }

        let lock = self.info.load_from_uri_lock.clone();
        let guard = tokio::select! {
            guard = lock.lock() => guard,
            _ = self.interrupt.interrupted() => {
                tracing::debug!(uri = %self.info.uri, "Task interrupted waiting for uri lock");
                return;
            }
        };
        let outcome = self.load_bitmap().await;
        drop(guard);

        match outcome {
            Ok(bitmap) => self.dispatch_display(bitmap),
            Err(TaskError::NotActual) => {
                tracing::debug!(
                    key = %self.info.memory_cache_key,
                    interrupted = self.is_task_interrupted(),
                    "Task is no longer actual, dropping result"
                );
            }
            Err(TaskError::Failed(cause)) => self.fire_fail_event(cause),
            Err(TaskError::Aborted(reason)) => self.fire_cancel_event(&reason),
        }
    }

    /// Block at the gate while loading is paused. Returns true if the task
    /// should stop (interrupted, or target stale after admission).
    async fn wait_if_paused(&self) -> bool {
        if self.ctx.gate.is_paused() {
            tracing::debug!(uri = %self.info.uri, "Loading paused, waiting for resume");
            tokio::select! {
                _ = self.ctx.gate.wait_until_open() => {
                    tracing::debug!(uri = %self.info.uri, "Resumed after pause");
                }
                _ = self.interrupt.interrupted() => {
                    tracing::debug!(uri = %self.info.uri, "Interrupted while paused");
                    return true;
                }
            }
        }
        self.is_task_interrupted() || self.is_task_not_actual()
    }

    async fn load_bitmap(&self) -> Result<Bitmap, TaskError> {
        self.check_task_not_actual()?;

        let key = &self.info.memory_cache_key;
        if let Some(bitmap) = self.ctx.cache.get_decoded(key).await {
            tracing::debug!(key = %key, "Memory cache hit");
            return Ok(bitmap);
        }

        let bitmap = self.try_load_bitmap().await?;
        self.check_task_not_actual()?;

        self.ctx.cache.put_decoded(key, bitmap.clone()).await;
        Ok(bitmap)
    }

    async fn try_load_bitmap(&self) -> Result<Bitmap, TaskError> {
        let uri = &self.info.uri;

        if let Some(path) = self.ctx.cache.get_disk_path(uri).await {
            self.check_task_not_actual()?;
            tracing::debug!(uri = %uri, path = %path.display(), "Loading image from disk cache");

            match self.decode_image(ImageSource::File(path)).await {
                Ok(bitmap) if bitmap.is_valid() => return Ok(bitmap),
                Ok(_) => {
                    tracing::debug!(uri = %uri, "Disk blob decoded to an unusable bitmap");
                }
                Err(TaskError::Failed(Some(cause)))
                    if !matches!(cause, LoadError::OutOfMemory(_)) =>
                {
                    tracing::warn!(uri = %uri, error = %cause, "Disk blob unreadable, refetching");
                }
                Err(other) => return Err(other),
            }
            self.check_task_not_actual()?;
        }

        tracing::debug!(uri = %uri, "Loading image from network");
        self.try_cache_image_on_disk().await?;
        self.check_task_not_actual()?;

        let path = self.ctx.cache.get_disk_path(uri).await.ok_or_else(|| {
            TaskError::Failed(Some(LoadError::IllegalState(format!(
                "no disk blob for {} after a successful save",
                uri
            ))))
        })?;

        let bitmap = self.decode_image(ImageSource::File(path)).await?;
        if !bitmap.is_valid() {
            return Err(TaskError::Failed(None));
        }
        Ok(bitmap)
    }

    /// Download the image and persist it. The write is never rolled back,
    /// even if the task turns out to be stale afterwards.
    async fn try_cache_image_on_disk(&self) -> Result<u64, TaskError> {
        let request = RequestData::new(self.info.uri.clone(), None);
        let response = tokio::select! {
            response = self.ctx.transport.fetch(&request) => response,
            _ = self.interrupt.interrupted() => return Err(TaskError::NotActual),
        };
        let response = response.map_err(|e| TaskError::Failed(Some(e.into())))?;

        self.ctx
            .cache
            .try_save(&self.info.uri, response.body)
            .await
            .map_err(|e| TaskError::Failed(Some(LoadError::from_save(&self.info.uri, e))))
    }

    async fn decode_image(&self, source: ImageSource) -> Result<Bitmap, TaskError> {
        let decoder = self.ctx.decoder.clone();
        let size = self.info.image_size;
        let origin = source.origin();

        let result = tokio::task::spawn_blocking(move || decoder.decode(&source, size)).await;
        self.check_task_not_actual()?;

        match result {
            Ok(Ok(bitmap)) => {
                tracing::debug!(
                    uri = %self.info.uri,
                    origin,
                    width = bitmap.width(),
                    height = bitmap.height(),
                    "Image decoded"
                );
                Ok(bitmap)
            }
            Ok(Err(e)) => Err(TaskError::Failed(Some(e.into()))),
            Err(join) if join.is_panic() => Err(TaskError::Failed(Some(
                LoadError::Uncategorized(format!("decoder panicked for {}", self.info.uri)),
            ))),
            Err(join) => Err(TaskError::Aborted(join.to_string())),
        }
    }

    fn check_task_not_actual(&self) -> Result<(), TaskError> {
        if self.is_task_interrupted() || self.is_task_not_actual() {
            Err(TaskError::NotActual)
        } else {
            Ok(())
        }
    }

    fn is_task_interrupted(&self) -> bool {
        self.interrupt.is_interrupted()
    }

    fn is_task_not_actual(&self) -> bool {
        self.ctx
            .tracker
            .is_stale(&self.info.target, &self.info.memory_cache_key)
    }

    fn dispatch_display(&self, bitmap: Bitmap) {
        let task = DisplayTask::new(bitmap, self.info.clone(), self.ctx.clone());
        self.ctx.dispatcher.post(Box::new(move || task.run()));
    }

    fn fire_fail_event(&self, cause: Option<LoadError>) {
        if self.is_task_interrupted() || self.is_task_not_actual() {
            tracing::debug!(uri = %self.info.uri, "Suppressing failure of a stale task");
            return;
        }
        match &cause {
            Some(e) => tracing::warn!(uri = %self.info.uri, error = %e, "Image load failed"),
            None => tracing::warn!(uri = %self.info.uri, "Image decoded to an unusable bitmap"),
        }

        let info = self.info.clone();
        self.ctx.dispatcher.post(Box::new(move || {
            info.listener.on_failure(&info.uri, &info.target, cause);
        }));
    }

    fn fire_cancel_event(&self, reason: &str) {
        if self.is_task_interrupted() {
            return;
        }
        tracing::debug!(uri = %self.info.uri, reason = %reason, "Image load cancelled");

        let info = self.info.clone();
        self.ctx.dispatcher.post(Box::new(move || {
            info.listener.on_cancelled(&info.uri, &info.target);
        }));
    }
}
