//! Domain types for livesync.
//!
//! This module contains the core data structures:
//! - Video: What the upstream platform reports
//! - ContentRecord: The CMS projection of a video
//! - SyncReport: What a reconciliation run did

pub mod record;
pub mod report;
pub mod video;

// Re-export commonly used types
pub use record::{ContentRecord, NewRecord, RecordUpdate, UpdateOutcome};
pub use report::{MirrorAction, RecordAction, SyncReport, VideoOutcome};
pub use video::{LiveStatus, Video};
