//! Records held by the content-management system.
//!
//! A `ContentRecord` is the CMS projection of one video. Records are
//! addressed by a store-assigned id that is distinct from the video id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::video::{LiveStatus, Video};

/// A record as it currently exists in the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Opaque store-assigned identifier
    pub id: String,

    /// Video this record describes (unique across records)
    pub video_id: String,

    pub title: String,

    pub slug: String,

    pub published_at: Option<DateTime<Utc>>,

    pub live_status: LiveStatus,

    /// Public URL of the mirrored asset, if one was ever recorded
    pub asset_url: Option<String>,

    pub archived: bool,

    pub draft: bool,
}

/// Payload for creating a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub video_id: String,
    pub title: String,
    pub slug: String,
    pub published_at: DateTime<Utc>,
    pub live_status: LiveStatus,
    pub asset_url: String,
    pub archived: bool,
    pub draft: bool,
}

impl NewRecord {
    /// Build a published (non-archived, non-draft) record for a video
    pub fn new(video: &Video, slug: String, asset_url: String) -> Self {
        Self {
            video_id: video.id.clone(),
            title: video.title.clone(),
            slug,
            published_at: video.published_at,
            live_status: video.live_status,
            asset_url,
            archived: false,
            draft: false,
        }
    }

    /// Materialize the record under a store-assigned id
    pub fn into_record(self, id: impl Into<String>) -> ContentRecord {
        ContentRecord {
            id: id.into(),
            video_id: self.video_id,
            title: self.title,
            slug: self.slug,
            published_at: Some(self.published_at),
            live_status: self.live_status,
            asset_url: Some(self.asset_url),
            archived: self.archived,
            draft: self.draft,
        }
    }
}

/// Partial update of a record. `None` fields are left untouched.
///
/// The asset URL can only be replaced, never cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_status: Option<LiveStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
}

impl RecordUpdate {
    /// The update applied when a broadcast has finished
    pub fn broadcast_completed(asset_url: impl Into<String>) -> Self {
        Self {
            asset_url: Some(asset_url.into()),
            live_status: Some(LiveStatus::Completed),
            archived: Some(false),
            draft: Some(false),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.asset_url.is_none()
            && self.live_status.is_none()
            && self.archived.is_none()
            && self.draft.is_none()
    }

    /// True when every listed field already holds the desired value
    pub fn is_satisfied_by(&self, record: &ContentRecord) -> bool {
        let url_ok = match &self.asset_url {
            Some(url) => record.asset_url.as_deref() == Some(url.as_str()),
            None => true,
        };

        url_ok
            && self.live_status.map_or(true, |s| s == record.live_status)
            && self.archived.map_or(true, |a| a == record.archived)
            && self.draft.map_or(true, |d| d == record.draft)
    }

    /// Apply the listed fields to a record
    pub fn apply_to(&self, record: &mut ContentRecord) {
        if let Some(url) = &self.asset_url {
            record.asset_url = Some(url.clone());
        }
        if let Some(status) = self.live_status {
            record.live_status = status;
        }
        if let Some(archived) = self.archived {
            record.archived = archived;
        }
        if let Some(draft) = self.draft {
            record.draft = draft;
        }
    }
}

/// Result of a partial update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// Fields were written
    Updated,

    /// The record already matched; nothing was written
    Unchanged,
}
