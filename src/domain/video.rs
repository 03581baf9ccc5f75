//! Videos as reported by the upstream platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broadcast lifecycle stage of a video at the moment it was fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveStatus {
    /// A regular upload that never was a broadcast
    None,

    /// Currently broadcasting
    Live,

    /// Scheduled but not started
    Upcoming,

    /// Broadcast has ended
    Completed,
}

impl LiveStatus {
    /// Whether the broadcast has not reached its terminal stage yet
    pub fn is_still_live(&self) -> bool {
        matches!(self, LiveStatus::Live | LiveStatus::Upcoming)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, LiveStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LiveStatus::None => "none",
            LiveStatus::Live => "live",
            LiveStatus::Upcoming => "upcoming",
            LiveStatus::Completed => "completed",
        }
    }
}

impl Default for LiveStatus {
    fn default() -> Self {
        Self::None
    }
}

impl std::fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LiveStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(LiveStatus::None),
            "live" => Ok(LiveStatus::Live),
            "upcoming" => Ok(LiveStatus::Upcoming),
            "completed" => Ok(LiveStatus::Completed),
            _ => anyhow::bail!("Unknown live status: {}", s),
        }
    }
}

/// A video published on the upstream channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Stable platform identifier
    pub id: String,

    pub title: String,

    pub published_at: DateTime<Utc>,

    pub live_status: LiveStatus,
}

impl Video {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        published_at: DateTime<Utc>,
        live_status: LiveStatus,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            published_at,
            live_status,
        }
    }
}
