// Failure categorization as seen by the listener

use super::test_harness::*;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use rstest::rstest;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tsubame::transport::{RequestData, ResponseData, Transport, TransportError};
use tsubame::ImageSize;

#[derive(Clone, Copy, Debug)]
enum Outcome {
    Refused,
    NotFound,
    EmptyBody,
    BrokenBody,
    StalledBody,
    Garbage,
}

struct FailingTransport(Outcome);

#[async_trait]
impl Transport for FailingTransport {
    async fn fetch(&self, request: &RequestData) -> Result<ResponseData, TransportError> {
        match self.0 {
            Outcome::Refused => Err(TransportError::Connect {
                uri: request.uri.clone(),
                message: "connection refused".to_string(),
            }),
            Outcome::NotFound => Err(TransportError::Status {
                uri: request.uri.clone(),
                status: 404,
            }),
            Outcome::EmptyBody => Ok(ResponseData {
                content_length: Some(0),
                body: Box::pin(stream::empty::<Result<Bytes, std::io::Error>>()),
            }),
            Outcome::BrokenBody => Ok(ResponseData {
                content_length: None,
                body: Box::pin(stream::iter(vec![
                    Ok(Bytes::from_static(b"\x89PNG")),
                    Err(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "reset mid-body",
                    )),
                ])),
            }),
            Outcome::StalledBody => Ok(ResponseData {
                content_length: Some(1024),
                body: Box::pin(stream::iter(vec![
                    Ok(Bytes::from_static(b"\x89PNG")),
                    Err(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "operation timed out",
                    )),
                ])),
            }),
            Outcome::Garbage => Ok(ResponseData::from_bytes(Bytes::from_static(
                b"<html>not found</html>",
            ))),
        }
    }
}

#[rstest]
#[case::connection_refused(Outcome::Refused, "failure:connection")]
#[case::http_status(Outcome::NotFound, "failure:io")]
#[case::empty_body(Outcome::EmptyBody, "failure:cache")]
#[case::body_interrupted(Outcome::BrokenBody, "failure:io")]
#[case::body_timed_out(Outcome::StalledBody, "failure:connection")]
#[case::undecodable(Outcome::Garbage, "failure:decode")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failure_cause_reaches_listener(#[case] outcome: Outcome, #[case] expected: &str) {
    let mut t = TestLoader::new(Arc::new(FailingTransport(outcome)));
    let surface = Surface::new();
    let events = Recorder::new();

    t.loader
        .display_image(
            "http://x/img.png",
            &as_target(&surface),
            ImageSize::new(8, 8),
            events.clone(),
        )
        .join()
        .await;
    t.queue.run_pending();

    assert_eq!(events.events(), vec!["started", expected]);
    assert_eq!(surface.painted(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_save_leaves_no_blob() {
    let mut t = TestLoader::new(Arc::new(FailingTransport(Outcome::BrokenBody)));
    let surface = Surface::new();

    t.loader
        .display_image(
            "http://x/img.png",
            &as_target(&surface),
            ImageSize::new(8, 8),
            Recorder::new(),
        )
        .join()
        .await;
    t.queue.run_pending();

    assert!(t.loader.cache().get_disk_path("http://x/img.png").await.is_none());
    let leftovers = std::fs::read_dir(t.dir.path().join("entries"))
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_empty_uri_fails_with_illegal_state() {
    let transport = CountingTransport::new(png_bytes(8, 8));
    let mut t = TestLoader::new(transport.clone());
    let surface = Surface::new();
    let target = as_target(&surface);
    let events = Recorder::new();

    let handle = t
        .loader
        .display_image("", &target, ImageSize::new(8, 8), events.clone());
    assert!(handle.is_finished());
    handle.join().await;

    // the failure still arrives through the UI queue
    assert_eq!(events.events(), vec!["started"]);
    t.queue.run_pending();

    assert_eq!(events.events(), vec!["started", "failure:illegal_state"]);
    assert_eq!(transport.calls(), 0);
    assert!(t.loader.loading_key_for(&target).is_none());
}

/// Refuses the connection, but only once the test opens the gate
struct LateRefusal {
    gate: watch::Sender<bool>,
    entered: AtomicBool,
}

impl LateRefusal {
    fn new() -> Arc<Self> {
        let (gate, _) = watch::channel(false);
        Arc::new(Self {
            gate,
            entered: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Transport for LateRefusal {
    async fn fetch(&self, request: &RequestData) -> Result<ResponseData, TransportError> {
        let mut rx = self.gate.subscribe();
        self.entered.store(true, Ordering::SeqCst);
        let _ = rx.wait_for(|open| *open).await;
        Err(TransportError::Connect {
            uri: request.uri.clone(),
            message: "connection refused".to_string(),
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failure_after_rebind_is_suppressed() {
    let transport = LateRefusal::new();
    let mut t = TestLoader::new(transport.clone());
    let surface = Surface::new();
    let target = as_target(&surface);
    let events = Recorder::new();

    let handle = t.loader.display_image(
        "http://x/img.png",
        &target,
        ImageSize::new(8, 8),
        events.clone(),
    );
    while !transport.entered.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // the task is past admission and parked in the fetch when the target moves on
    t.loader.cancel_display(&target);
    transport.gate.send_replace(true);
    handle.join().await;
    t.queue.run_pending();

    assert_eq!(events.events(), vec!["started"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_same_failure_reaches_listener_when_target_is_current() {
    let transport = LateRefusal::new();
    let mut t = TestLoader::new(transport.clone());
    let surface = Surface::new();
    let events = Recorder::new();

    transport.gate.send_replace(true);
    t.loader
        .display_image(
            "http://x/img.png",
            &as_target(&surface),
            ImageSize::new(8, 8),
            events.clone(),
        )
        .join()
        .await;
    t.queue.run_pending();

    assert_eq!(events.events(), vec!["started", "failure:connection"]);
}
