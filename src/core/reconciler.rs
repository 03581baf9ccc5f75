//! Reconciliation of source videos, mirrored assets and CMS records.
//!
//! One run takes a fresh video listing and a fresh record snapshot, then
//! walks the videos one at a time. For each video the mirror side is settled
//! first (existence check, transfer only when missing), then the record side
//! (create when absent, update only on the live -> completed transition).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::adapters::{AssetMirror, RecordStore, VideoSource};
use crate::domain::{
    ContentRecord, MirrorAction, NewRecord, RecordAction, RecordUpdate, SyncReport,
    UpdateOutcome, Video, VideoOutcome,
};

use super::error::SyncError;
use super::slug::slugify;

/// Default lookback window for the source listing
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Drives one sync run across the three collaborators
pub struct Reconciler {
    source: Arc<dyn VideoSource>,
    mirror: Arc<dyn AssetMirror>,
    records: Arc<dyn RecordStore>,
    window: Duration,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn VideoSource>,
        mirror: Arc<dyn AssetMirror>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            source,
            mirror,
            records,
            window: Duration::days(DEFAULT_WINDOW_DAYS),
        }
    }

    /// Override the lookback window
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Execute one reconciliation run.
    ///
    /// Returns `Err` only for the fatal listing failures; per-video problems
    /// are recorded in the report and the run carries on.
    #[instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::new(Uuid::new_v4());
        tracing::Span::current().record("run_id", tracing::field::display(report.run_id));
        info!(
            source = self.source.name(),
            mirror = self.mirror.name(),
            records = self.records.name(),
            window_days = self.window.num_days(),
            "Starting sync run"
        );

        let videos = self.source.list_recent(self.window).await.map_err(|e| {
            error!(error = %e, "Failed to list videos, aborting run");
            e
        })?;
        debug!(count = videos.len(), "Fetched videos");

        let existing = self.records.list_existing().await.map_err(|e| {
            error!(error = %e, "Failed to list existing records, aborting run");
            e
        })?;
        debug!(count = existing.len(), "Fetched existing records");

        let mut seen: HashSet<&str> = HashSet::new();
        for video in &videos {
            if !seen.insert(video.id.as_str()) {
                debug!(video_id = %video.id, "Video listed twice, skipping repeat");
                continue;
            }
            let outcome = self.process_video(video, &existing).await;
            report.push(outcome);
        }

        report.finish();
        info!(
            videos = report.outcomes.len(),
            mirrored = report.mirrors_performed(),
            writes = report.record_writes(),
            failures = report.failures(),
            "Sync run completed"
        );
        Ok(report)
    }

    /// Settle the mirror side, then the record side, for one video
    #[instrument(skip_all, fields(video_id = %video.id))]
    async fn process_video(
        &self,
        video: &Video,
        existing: &HashMap<String, ContentRecord>,
    ) -> VideoOutcome {
        let (mirror, asset_url) = match self.ensure_mirrored(video).await {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = %e, "Mirror failed, skipping video for this run");
                return VideoOutcome {
                    video_id: video.id.clone(),
                    mirror: MirrorAction::Failed {
                        error: e.to_string(),
                    },
                    record: RecordAction::Skipped,
                };
            }
        };

        let record = match existing.get(&video.id) {
            None => self.create_record(video, asset_url).await,
            Some(current) => self.refresh_record(video, current, asset_url).await,
        };

        VideoOutcome {
            video_id: video.id.clone(),
            mirror,
            record,
        }
    }

    async fn ensure_mirrored(&self, video: &Video) -> Result<(MirrorAction, String), SyncError> {
        if self.mirror.exists(&video.id).await? {
            debug!("Asset already mirrored");
            return Ok((MirrorAction::AlreadyPresent, self.mirror.derive_url(&video.id)));
        }

        let locator = self.source.source_locator(&video.id);
        info!(%locator, "Mirroring asset");
        let url = self.mirror.mirror(&video.id, &locator).await?;
        info!(%url, "Asset mirrored");
        Ok((MirrorAction::Mirrored, url))
    }

    async fn create_record(&self, video: &Video, asset_url: String) -> RecordAction {
        let record = build_record(video, asset_url);

        match self.records.create(&record).await {
            Ok(created) => {
                info!(record_id = %created.id, slug = %created.slug, "Created record");
                RecordAction::Created {
                    record_id: created.id,
                }
            }
            Err(SyncError::DuplicateConflict { .. }) => {
                info!("Record already exists in store, nothing to create");
                RecordAction::Duplicate
            }
            Err(e) => {
                error!(error = %e, "Failed to create record");
                RecordAction::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn refresh_record(
        &self,
        video: &Video,
        current: &ContentRecord,
        asset_url: String,
    ) -> RecordAction {
        if !video.live_status.is_completed() || !current.live_status.is_still_live() {
            debug!(
                fetched = %video.live_status,
                stored = %current.live_status,
                "No status transition, leaving record as is"
            );
            return RecordAction::NoChange;
        }

        let update = RecordUpdate::broadcast_completed(asset_url);
        match self.records.update(&current.id, &update).await {
            Ok(UpdateOutcome::Updated) => {
                info!(record_id = %current.id, "Marked record as completed");
                RecordAction::Updated {
                    record_id: current.id.clone(),
                }
            }
            Ok(UpdateOutcome::Unchanged) => {
                info!(record_id = %current.id, "Record already up to date");
                RecordAction::Unchanged {
                    record_id: current.id.clone(),
                }
            }
            Err(e) => {
                error!(record_id = %current.id, error = %e, "Failed to update record");
                RecordAction::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Build the create payload for a video. An empty slug falls back to the
/// lowercased video id.
pub fn build_record(video: &Video, asset_url: String) -> NewRecord {
    let mut slug = slugify(&video.title);
    if slug.is_empty() {
        slug = video.id.to_lowercase();
    }
    NewRecord::new(video, slug, asset_url)
}
