//! Error taxonomy for a sync run.
//!
//! Listing failures are fatal for the run; everything keyed by a single
//! video is recoverable and only affects that video.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Video source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Record listing unavailable: {0}")]
    RecordListUnavailable(String),

    #[error("Mirror failed for video {video_id}: {reason}")]
    MirrorFailure { video_id: String, reason: String },

    #[error("Record for video {video_id} already exists")]
    DuplicateConflict { video_id: String },

    /// `target` is the video id for creates and the record id for updates
    #[error("Record write failed ({target}): {reason}")]
    RecordWriteFailure { target: String, reason: String },
}

impl SyncError {
    /// Whether this error aborts the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::SourceUnavailable(_) | SyncError::RecordListUnavailable(_)
        )
    }

    pub fn source_unavailable(err: anyhow::Error) -> Self {
        Self::SourceUnavailable(format!("{:#}", err))
    }

    pub fn record_list_unavailable(err: anyhow::Error) -> Self {
        Self::RecordListUnavailable(format!("{:#}", err))
    }

    pub fn mirror_failure(video_id: &str, err: anyhow::Error) -> Self {
        Self::MirrorFailure {
            video_id: video_id.to_string(),
            reason: format!("{:#}", err),
        }
    }

    pub fn record_write_failure(target: &str, err: anyhow::Error) -> Self {
        Self::RecordWriteFailure {
            target: target.to_string(),
            reason: format!("{:#}", err),
        }
    }
}
