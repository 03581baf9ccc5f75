//! livesync - Livestream mirror and CMS sync
//!
//! Polls a YouTube channel for recent livestreams, makes sure each video's
//! media is mirrored to a BunnyCDN storage zone, and keeps one Webflow CMS
//! item per video in step with it.
//!
//! # Architecture
//!
//! The reconciler is pure decision logic over three collaborator traits:
//! - `VideoSource`: recent videos and their live status
//! - `AssetMirror`: existence check, transfer, public URL
//! - `RecordStore`: snapshot, create, partial update
//!
//! Each run re-derives all state from the collaborators; nothing is
//! persisted between runs.
//!
//! # Modules
//!
//! - `adapters`: Collaborator traits and vendor implementations
//! - `core`: Reconciler, slug derivation, error taxonomy
//! - `domain`: Data structures (Video, ContentRecord, SyncReport)
//! - `config`: YAML configuration loading
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # One pass
//! livesync run --config livesync.yaml
//!
//! # Every 30 minutes
//! livesync watch --interval-minutes 30
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;

// Re-export main types at crate root for convenience
pub use adapters::{AssetMirror, RecordStore, Traced, VideoSource};
pub use core::{slugify, Reconciler, SyncError};
pub use domain::{ContentRecord, LiveStatus, NewRecord, RecordUpdate, SyncReport, Video};
