//! Core sync logic.
//!
//! This module contains:
//! - Reconciler: Decides and sequences mirror and record actions per video
//! - Slug: Title to URL slug derivation
//! - SyncError: Fatal and per-video error taxonomy

pub mod error;
pub mod reconciler;
pub mod slug;

// Re-export commonly used types
pub use error::SyncError;
pub use reconciler::{build_record, Reconciler, DEFAULT_WINDOW_DAYS};
pub use slug::slugify;
