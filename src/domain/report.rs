//! Per-run report of what the reconciler did.
//!
//! Every video the reconciler looks at produces exactly one `VideoOutcome`,
//! so skips and no-ops are as visible to the operator as writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened on the mirror side for one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum MirrorAction {
    /// Asset was already stored; nothing transferred
    AlreadyPresent,

    /// Asset was fetched and uploaded during this run
    Mirrored,

    /// Existence check or transfer failed
    Failed { error: String },
}

/// What happened on the record side for one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum RecordAction {
    Created { record_id: String },

    /// The store already holds a record for this video
    Duplicate,

    Updated { record_id: String },

    /// Update was issued but the record already matched
    Unchanged { record_id: String },

    /// Record exists and no transition applies
    NoChange,

    /// Not attempted because the mirror step failed
    Skipped,

    Failed { error: String },
}

/// Outcome for a single video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoOutcome {
    pub video_id: String,
    pub mirror: MirrorAction,
    pub record: RecordAction,
}

impl VideoOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.mirror, MirrorAction::Failed { .. })
            || matches!(self.record, RecordAction::Failed { .. })
    }
}

/// Summary of one reconciliation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<VideoOutcome>,
}

impl SyncReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            completed_at: None,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: VideoOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Number of assets transferred to the mirror
    pub fn mirrors_performed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.mirror == MirrorAction::Mirrored)
            .count()
    }

    /// Number of creates and effective updates written to the record store
    pub fn record_writes(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.record,
                    RecordAction::Created { .. } | RecordAction::Updated { .. }
                )
            })
            .count()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn outcome(&self, video_id: &str) -> Option<&VideoOutcome> {
        self.outcomes.iter().find(|o| o.video_id == video_id)
    }
}
