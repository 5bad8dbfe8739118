// Per-uri serialization: concurrent loads of one uri fetch it once

use super::test_harness::*;
use std::time::Duration;
use tsubame::ImageSize;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_loads_of_same_uri_fetch_once() {
    let transport = CountingTransport::with_delay(png_bytes(16, 16), Duration::from_millis(50));
    let mut t = TestLoader::new(transport.clone());
    let size = ImageSize::new(16, 16);

    let surfaces: Vec<_> = (0..5).map(|_| Surface::new()).collect();
    let events = Recorder::new();
    let handles: Vec<_> = surfaces
        .iter()
        .map(|s| {
            t.loader
                .display_image("http://x/shared.png", &as_target(s), size, events.clone())
        })
        .collect();

    for handle in handles {
        handle.join().await;
    }
    t.queue.run_pending();

    assert_eq!(transport.calls(), 1);
    assert!(surfaces.iter().all(|s| s.painted() == 1));
    let successes = events.events().iter().filter(|e| *e == "success").count();
    assert_eq!(successes, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_uris_load_in_parallel() {
    let transport = CountingTransport::with_delay(png_bytes(8, 8), Duration::from_millis(200));
    let mut t = TestLoader::new(transport.clone());

    let surfaces: Vec<_> = (0..3).map(|_| Surface::new()).collect();
    let events = Recorder::new();
    let started = std::time::Instant::now();
    let handles: Vec<_> = surfaces
        .iter()
        .enumerate()
        .map(|(i, s)| {
            t.loader.display_image(
                &format!("http://x/{}.png", i),
                &as_target(s),
                ImageSize::new(8, 8),
                events.clone(),
            )
        })
        .collect();
    for handle in handles {
        handle.join().await;
    }
    t.queue.run_pending();

    assert_eq!(transport.calls(), 3);
    // three serial fetches would take at least 600ms
    assert!(started.elapsed() < Duration::from_millis(550));
    assert!(surfaces.iter().all(|s| s.painted() == 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_surface_rebound_rapidly_shows_only_last() {
    let transport = CountingTransport::with_delay(png_bytes(8, 8), Duration::from_millis(20));
    let mut t = TestLoader::new(transport.clone());
    let surface = Surface::new();
    let target = as_target(&surface);

    let recorders: Vec<_> = (0..4).map(|_| Recorder::new()).collect();
    let handles: Vec<_> = recorders
        .iter()
        .enumerate()
        .map(|(i, r)| {
            t.loader.display_image(
                &format!("http://x/{}.png", i),
                &target,
                ImageSize::new(8, 8),
                r.clone(),
            )
        })
        .collect();
    for handle in handles {
        handle.join().await;
    }
    t.queue.run_pending();

    for stale in &recorders[..3] {
        assert!(!stale.events().iter().any(|e| e == "success"));
    }
    assert_eq!(recorders[3].events(), vec!["started", "success"]);
    assert_eq!(surface.painted(), 1);
}
