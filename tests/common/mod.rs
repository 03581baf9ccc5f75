//! In-memory collaborators for reconciler tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use livesync::adapters::{AssetMirror, RecordStore, VideoSource};
use livesync::domain::{ContentRecord, LiveStatus, NewRecord, RecordUpdate, UpdateOutcome, Video};
use livesync::{Reconciler, SyncError};

pub fn video(id: &str, title: &str, status: LiveStatus) -> Video {
    Video::new(
        id,
        title,
        Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap(),
        status,
    )
}

/// Video source serving a fixed, replaceable list
#[derive(Default)]
pub struct FakeSource {
    videos: Mutex<Vec<Video>>,
    unavailable: AtomicBool,
}

impl FakeSource {
    pub fn new(videos: Vec<Video>) -> Self {
        Self {
            videos: Mutex::new(videos),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_videos(&self, videos: Vec<Video>) {
        *self.videos.lock().unwrap() = videos;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl VideoSource for FakeSource {
    fn name(&self) -> &str {
        "fake-source"
    }

    async fn list_recent(&self, _window: Duration) -> Result<Vec<Video>, SyncError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SyncError::SourceUnavailable("upstream down".to_string()));
        }
        Ok(self.videos.lock().unwrap().clone())
    }

    fn source_locator(&self, video_id: &str) -> String {
        format!("https://source.test/watch?v={}", video_id)
    }
}

/// Mirror backed by a set of stored ids
#[derive(Default)]
pub struct FakeMirror {
    stored: Mutex<HashSet<String>>,
    broken: Mutex<HashSet<String>>,
    unreachable: Mutex<HashSet<String>>,
    mirror_calls: Mutex<Vec<String>>,
}

impl FakeMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stored(ids: &[&str]) -> Self {
        let mirror = Self::default();
        mirror
            .stored
            .lock()
            .unwrap()
            .extend(ids.iter().map(|s| s.to_string()));
        mirror
    }

    /// Make transfers of this id fail
    pub fn break_video(&self, video_id: &str) {
        self.broken.lock().unwrap().insert(video_id.to_string());
    }

    /// Make existence checks of this id fail
    pub fn fail_exists(&self, video_id: &str) {
        self.unreachable.lock().unwrap().insert(video_id.to_string());
    }

    pub fn mirror_calls(&self) -> Vec<String> {
        self.mirror_calls.lock().unwrap().clone()
    }

    pub fn is_stored(&self, video_id: &str) -> bool {
        self.stored.lock().unwrap().contains(video_id)
    }
}

#[async_trait]
impl AssetMirror for FakeMirror {
    fn name(&self) -> &str {
        "fake-mirror"
    }

    async fn exists(&self, video_id: &str) -> Result<bool, SyncError> {
        if self.unreachable.lock().unwrap().contains(video_id) {
            return Err(SyncError::MirrorFailure {
                video_id: video_id.to_string(),
                reason: "storage listing timed out".to_string(),
            });
        }
        Ok(self.is_stored(video_id))
    }

    async fn mirror(&self, video_id: &str, _source_locator: &str) -> Result<String, SyncError> {
        self.mirror_calls.lock().unwrap().push(video_id.to_string());
        if self.broken.lock().unwrap().contains(video_id) {
            return Err(SyncError::MirrorFailure {
                video_id: video_id.to_string(),
                reason: "download failed".to_string(),
            });
        }
        self.stored.lock().unwrap().insert(video_id.to_string());
        Ok(self.derive_url(video_id))
    }

    fn derive_url(&self, video_id: &str) -> String {
        format!("https://cdn.test/{}.mp4", video_id)
    }
}

/// Record store keyed by generated record ids
#[derive(Default)]
pub struct FakeStore {
    records: Mutex<HashMap<String, ContentRecord>>,
    hidden_from_listing: Mutex<HashSet<String>>,
    failing_writes: Mutex<HashSet<String>>,
    next_id: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
    list_unavailable: AtomicBool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record; returns its record id
    pub fn seed(&self, video: &Video, asset_url: Option<&str>) -> String {
        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = ContentRecord {
            id: id.clone(),
            video_id: video.id.clone(),
            title: video.title.clone(),
            slug: livesync::slugify(&video.title),
            published_at: Some(video.published_at),
            live_status: video.live_status,
            asset_url: asset_url.map(str::to_string),
            archived: false,
            draft: false,
        };
        self.records.lock().unwrap().insert(id.clone(), record);
        id
    }

    /// Keep a video's record out of `list_existing` to simulate a concurrent writer
    pub fn hide_from_listing(&self, video_id: &str) {
        self.hidden_from_listing
            .lock()
            .unwrap()
            .insert(video_id.to_string());
    }

    /// Reject creates and updates touching this video
    pub fn fail_writes_for(&self, video_id: &str) {
        self.failing_writes
            .lock()
            .unwrap()
            .insert(video_id.to_string());
    }

    fn write_rejected(&self, video_id: &str) -> bool {
        self.failing_writes.lock().unwrap().contains(video_id)
    }

    pub fn set_list_unavailable(&self, unavailable: bool) {
        self.list_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Effective writes (creates plus updates that changed something)
    pub fn writes(&self) -> usize {
        self.creates.load(Ordering::SeqCst) + self.updates.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn records_for(&self, video_id: &str) -> Vec<ContentRecord> {
        self.records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.video_id == video_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    fn name(&self) -> &str {
        "fake-store"
    }

    async fn list_existing(&self) -> Result<HashMap<String, ContentRecord>, SyncError> {
        if self.list_unavailable.load(Ordering::SeqCst) {
            return Err(SyncError::RecordListUnavailable("cms down".to_string()));
        }
        let hidden = self.hidden_from_listing.lock().unwrap();
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| !hidden.contains(&r.video_id))
            .map(|r| (r.video_id.clone(), r.clone()))
            .collect())
    }

    async fn create(&self, record: &NewRecord) -> Result<ContentRecord, SyncError> {
        if self.write_rejected(&record.video_id) {
            return Err(SyncError::RecordWriteFailure {
                target: record.video_id.clone(),
                reason: "validation error".to_string(),
            });
        }
        let mut records = self.records.lock().unwrap();
        if records.values().any(|r| r.video_id == record.video_id) {
            return Err(SyncError::DuplicateConflict {
                video_id: record.video_id.clone(),
            });
        }
        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let created = record.clone().into_record(id.clone());
        records.insert(id, created.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(created)
    }

    async fn update(
        &self,
        record_id: &str,
        fields: &RecordUpdate,
    ) -> Result<UpdateOutcome, SyncError> {
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(record_id).ok_or_else(|| SyncError::RecordWriteFailure {
            target: record_id.to_string(),
            reason: "no such record".to_string(),
        })?;
        if self.write_rejected(&record.video_id) {
            return Err(SyncError::RecordWriteFailure {
                target: record_id.to_string(),
                reason: "validation error".to_string(),
            });
        }
        if fields.is_satisfied_by(record) {
            return Ok(UpdateOutcome::Unchanged);
        }
        fields.apply_to(record);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(UpdateOutcome::Updated)
    }
}

pub fn reconciler(
    source: &Arc<FakeSource>,
    mirror: &Arc<FakeMirror>,
    store: &Arc<FakeStore>,
) -> Reconciler {
    Reconciler::new(source.clone(), mirror.clone(), store.clone())
}
