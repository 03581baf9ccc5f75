//! Call-boundary tracing for collaborators.
//!
//! `Traced<T>` wraps a collaborator and logs entry, exit and elapsed time
//! of every trait call, plus the error on failure. It is applied when the
//! collaborators are wired up, so the reconciler never logs I/O itself.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, info, warn};

use super::{AssetMirror, RecordStore, VideoSource};
use crate::core::SyncError;
use crate::domain::{ContentRecord, NewRecord, RecordUpdate, UpdateOutcome, Video};

/// Tracing decorator around a collaborator
pub struct Traced<T> {
    inner: T,
}

impl<T> Traced<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

fn finish<R>(
    adapter: &str,
    call: &'static str,
    started: Instant,
    result: Result<R, SyncError>,
) -> Result<R, SyncError> {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => debug!(adapter, call, elapsed_ms, "Call completed"),
        // Expected when another writer got there first
        Err(e @ SyncError::DuplicateConflict { .. }) => {
            info!(adapter, call, elapsed_ms, outcome = %e, "Call found existing record")
        }
        Err(e) => warn!(adapter, call, elapsed_ms, error = %e, "Call failed"),
    }
    result
}

#[async_trait]
impl<T: VideoSource> VideoSource for Traced<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn list_recent(&self, window: Duration) -> Result<Vec<Video>, SyncError> {
        debug!(adapter = self.name(), call = "list_recent", window_days = window.num_days(), "Calling");
        let started = Instant::now();
        let result = self.inner.list_recent(window).await;
        finish(self.name(), "list_recent", started, result)
    }

    fn source_locator(&self, video_id: &str) -> String {
        self.inner.source_locator(video_id)
    }
}

#[async_trait]
impl<T: AssetMirror> AssetMirror for Traced<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn exists(&self, video_id: &str) -> Result<bool, SyncError> {
        debug!(adapter = self.name(), call = "exists", video_id, "Calling");
        let started = Instant::now();
        let result = self.inner.exists(video_id).await;
        finish(self.name(), "exists", started, result)
    }

    async fn mirror(&self, video_id: &str, source_locator: &str) -> Result<String, SyncError> {
        debug!(adapter = self.name(), call = "mirror", video_id, source_locator, "Calling");
        let started = Instant::now();
        let result = self.inner.mirror(video_id, source_locator).await;
        finish(self.name(), "mirror", started, result)
    }

    fn derive_url(&self, video_id: &str) -> String {
        self.inner.derive_url(video_id)
    }
}

#[async_trait]
impl<T: RecordStore> RecordStore for Traced<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn list_existing(&self) -> Result<HashMap<String, ContentRecord>, SyncError> {
        debug!(adapter = self.name(), call = "list_existing", "Calling");
        let started = Instant::now();
        let result = self.inner.list_existing().await;
        finish(self.name(), "list_existing", started, result)
    }

    async fn create(&self, record: &NewRecord) -> Result<ContentRecord, SyncError> {
        debug!(adapter = self.name(), call = "create", video_id = %record.video_id, "Calling");
        let started = Instant::now();
        let result = self.inner.create(record).await;
        finish(self.name(), "create", started, result)
    }

    async fn update(
        &self,
        record_id: &str,
        fields: &RecordUpdate,
    ) -> Result<UpdateOutcome, SyncError> {
        debug!(adapter = self.name(), call = "update", record_id, "Calling");
        let started = Instant::now();
        let result = self.inner.update(record_id, fields).await;
        finish(self.name(), "update", started, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedMirror;

    #[async_trait]
    impl AssetMirror for FixedMirror {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn exists(&self, video_id: &str) -> Result<bool, SyncError> {
            Ok(video_id == "present")
        }

        async fn mirror(&self, video_id: &str, _source_locator: &str) -> Result<String, SyncError> {
            Err(SyncError::MirrorFailure {
                video_id: video_id.to_string(),
                reason: "offline".to_string(),
            })
        }

        fn derive_url(&self, video_id: &str) -> String {
            format!("https://cdn.test/{}.mp4", video_id)
        }
    }

    #[tokio::test]
    async fn test_traced_delegates() {
        let traced = Traced::new(FixedMirror);

        assert_eq!(traced.name(), "fixed");
        assert!(traced.exists("present").await.unwrap());
        assert!(!traced.exists("missing").await.unwrap());
        assert_eq!(traced.derive_url("x"), "https://cdn.test/x.mp4");
    }

    #[tokio::test]
    async fn test_traced_passes_errors_through() {
        let traced = Traced::new(FixedMirror);
        let err = traced.mirror("x", "https://source/x").await.unwrap_err();
        assert!(matches!(err, SyncError::MirrorFailure { .. }));
    }
}
