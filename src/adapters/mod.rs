//! Collaborator interfaces and their vendor implementations.
//!
//! The reconciler only sees the three traits defined here. Concrete
//! adapters talk to YouTube (video source), BunnyCDN (asset mirror) and
//! Webflow (record store). `Traced` wraps any of them with call-boundary
//! tracing.

pub mod bunny;
pub mod traced;
pub mod webflow;
pub mod youtube;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Duration;

use crate::core::SyncError;
use crate::domain::{ContentRecord, NewRecord, RecordUpdate, UpdateOutcome, Video};

pub use bunny::BunnyMirror;
pub use traced::Traced;
pub use webflow::WebflowStore;
pub use youtube::YouTubeSource;

/// Lists recently published videos
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Videos published within `window` of now
    async fn list_recent(&self, window: Duration) -> Result<Vec<Video>, SyncError>;

    /// Locator the video's media can be fetched from
    fn source_locator(&self, video_id: &str) -> String;
}

/// Durable copy of each video's media on a CDN origin
#[async_trait]
pub trait AssetMirror: Send + Sync {
    fn name(&self) -> &str;

    /// Whether `<video_id>.<ext>` is already stored
    async fn exists(&self, video_id: &str) -> Result<bool, SyncError>;

    /// Fetch the media from `source_locator`, store it, return its public URL
    async fn mirror(&self, video_id: &str, source_locator: &str) -> Result<String, SyncError>;

    /// Public URL of a stored asset, without I/O
    fn derive_url(&self, video_id: &str) -> String;
}

/// Per-video records in the content-management system
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn name(&self) -> &str;

    /// Snapshot of all records keyed by video id
    async fn list_existing(&self) -> Result<HashMap<String, ContentRecord>, SyncError>;

    /// Insert a record; `DuplicateConflict` if the store already has one
    async fn create(&self, record: &NewRecord) -> Result<ContentRecord, SyncError>;

    /// Partial update of the listed fields
    async fn update(
        &self,
        record_id: &str,
        fields: &RecordUpdate,
    ) -> Result<UpdateOutcome, SyncError>;
}
