// Pause gate: held tasks do no work until resume

use super::test_harness::*;
use std::time::Duration;
use tsubame::ImageSize;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_paused_tasks_wait_for_resume() {
    let transport = CountingTransport::new(png_bytes(8, 8));
    let mut t = TestLoader::new(transport.clone());

    t.loader.pause();
    assert!(t.loader.is_paused());

    let surfaces: Vec<_> = (0..3).map(|_| Surface::new()).collect();
    let events = Recorder::new();
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

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.calls(), 0);
    assert!(handles.iter().all(|h| !h.is_finished()));
    assert_eq!(t.queue.run_pending(), 0);

    t.loader.resume();
    for handle in handles {
        handle.join().await;
    }
    t.queue.run_pending();

    assert_eq!(transport.calls(), 3);
    assert!(surfaces.iter().all(|s| s.painted() == 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_target_rebound_while_paused_is_dropped_on_resume() {
    let transport = CountingTransport::new(png_bytes(8, 8));
    let mut t = TestLoader::new(transport.clone());
    let surface = Surface::new();
    let target = as_target(&surface);

    t.loader.pause();
    let first = Recorder::new();
    let first_handle =
        t.loader
            .display_image("http://x/a.png", &target, ImageSize::new(8, 8), first.clone());
    let second = Recorder::new();
    let second_handle =
        t.loader
            .display_image("http://x/b.png", &target, ImageSize::new(8, 8), second.clone());

    t.loader.resume();
    first_handle.join().await;
    second_handle.join().await;
    t.queue.run_pending();

    // the stale request never reached the transport
    assert_eq!(transport.calls(), 1);
    assert_eq!(first.events(), vec!["started"]);
    assert_eq!(second.events(), vec!["started", "success"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_memory_hits_also_wait_at_the_gate() {
    let transport = CountingTransport::new(png_bytes(8, 8));
    let mut t = TestLoader::new(transport.clone());
    let surface = Surface::new();
    let target = as_target(&surface);
    let events = Recorder::new();

    t.loader
        .display_image("http://x/a.png", &target, ImageSize::new(8, 8), events.clone())
        .join()
        .await;
    t.queue.run_pending();

    t.loader.pause();
    let handle =
        t.loader
            .display_image("http://x/a.png", &target, ImageSize::new(8, 8), events.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_finished());

    t.loader.resume();
    handle.join().await;
    t.queue.run_pending();

    assert_eq!(transport.calls(), 1);
    assert_eq!(surface.painted(), 2);
}
