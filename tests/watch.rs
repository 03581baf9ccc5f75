//! Watch Loop Tests
//!
//! Stopping must work between runs and while a run is still in flight.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use common::{video, FakeMirror, FakeSource, FakeStore};
use livesync::cli::watch_until;
use livesync::domain::{LiveStatus, Video};
use livesync::{Reconciler, SyncError, VideoSource};

/// Source whose listing never returns, like a run stuck in a long transfer
struct StalledSource {
    started: Mutex<Option<oneshot::Sender<()>>>,
    calls: AtomicUsize,
}

#[async_trait]
impl VideoSource for StalledSource {
    fn name(&self) -> &str {
        "stalled-source"
    }

    async fn list_recent(&self, _window: chrono::Duration) -> Result<Vec<Video>, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(started) = self.started.lock().unwrap().take() {
            let _ = started.send(());
        }
        std::future::pending().await
    }

    fn source_locator(&self, video_id: &str) -> String {
        format!("https://source.test/watch?v={}", video_id)
    }
}

#[tokio::test]
async fn test_stop_during_run_returns_promptly() {
    let (started_tx, started_rx) = oneshot::channel();
    let source = Arc::new(StalledSource {
        started: Mutex::new(Some(started_tx)),
        calls: AtomicUsize::new(0),
    });
    let reconciler = Reconciler::new(
        source.clone(),
        Arc::new(FakeMirror::new()),
        Arc::new(FakeStore::new()),
    );

    // Stop as soon as the first run is under way
    let stop = async {
        started_rx.await.ok();
    };
    let runs = tokio::time::timeout(
        Duration::from_secs(5),
        watch_until(&reconciler, Duration::from_secs(3600), stop),
    )
    .await
    .expect("watch loop ignored the stop signal during a run");

    assert_eq!(runs, 0);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stop_before_first_tick_runs_nothing() {
    let source = Arc::new(FakeSource::new(vec![video(
        "vid1",
        "Never Synced",
        LiveStatus::Completed,
    )]));
    let mirror = Arc::new(FakeMirror::new());
    let store = Arc::new(FakeStore::new());
    let reconciler = common::reconciler(&source, &mirror, &store);

    let runs = watch_until(&reconciler, Duration::from_secs(3600), async {}).await;

    assert_eq!(runs, 0);
    assert!(mirror.mirror_calls().is_empty());
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_completed_runs_are_counted() {
    let source = Arc::new(FakeSource::new(vec![video(
        "vid1",
        "Synced Once",
        LiveStatus::Completed,
    )]));
    let mirror = Arc::new(FakeMirror::new());
    let store = Arc::new(FakeStore::new());
    let reconciler = common::reconciler(&source, &mirror, &store);

    let runs = watch_until(
        &reconciler,
        Duration::from_millis(10),
        tokio::time::sleep(Duration::from_millis(100)),
    )
    .await;

    assert!(runs >= 1);
    // Later runs find everything in place
    assert_eq!(mirror.mirror_calls().len(), 1);
    assert_eq!(store.records_for("vid1").len(), 1);
}
