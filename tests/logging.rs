//! Log Level Tests
//!
//! A record that already exists is informational; real failures still warn.

mod common;

use std::io;
use std::sync::{Arc, Mutex};

use common::{video, FakeMirror, FakeSource, FakeStore};
use livesync::domain::{LiveStatus, RecordAction};
use livesync::{Reconciler, Traced};

/// Shared buffer the fmt layer writes into
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_warnings() -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (captured, tracing::subscriber::set_default(subscriber))
}

#[tokio::test]
async fn test_duplicate_create_logs_no_warning() {
    let vid = video("vid1", "Concurrent Broadcast", LiveStatus::Live);
    let source = Arc::new(FakeSource::new(vec![vid.clone()]));
    let mirror = Arc::new(FakeMirror::with_stored(&["vid1"]));
    let store = Arc::new(Traced::new(FakeStore::new()));
    store.inner().seed(&vid, Some("https://cdn.test/vid1.mp4"));
    store.inner().hide_from_listing("vid1");

    let (captured, _guard) = capture_warnings();
    let report = Reconciler::new(source, mirror, store.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome("vid1").unwrap().record, RecordAction::Duplicate);
    assert_eq!(captured.text(), "");
}

#[tokio::test]
async fn test_failed_create_still_warns() {
    let source = Arc::new(FakeSource::new(vec![video(
        "vid1",
        "Rejected Broadcast",
        LiveStatus::Completed,
    )]));
    let mirror = Arc::new(FakeMirror::new());
    let store = Arc::new(Traced::new(FakeStore::new()));
    store.inner().fail_writes_for("vid1");

    let (captured, _guard) = capture_warnings();
    Reconciler::new(source, mirror, store).run().await.unwrap();

    let text = captured.text();
    assert!(text.contains("WARN"));
    assert!(text.contains("Call failed"));
    assert!(text.contains("call=\"create\""));
}
