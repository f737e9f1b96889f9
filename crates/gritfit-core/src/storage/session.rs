//! Finished-run records and their aggregate summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-category totals of a finished run, in whole seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    pub work_time_sec: u64,
    pub rest_time_sec: u64,
    #[serde(default)]
    pub warmup_time_sec: u64,
    #[serde(default)]
    pub cooldown_time_sec: u64,
}

/// Immutable summary written once when a run ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    /// `None` for quick-start runs not tied to a saved program.
    pub program_id: Option<String>,
    pub program_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub completed_rounds: u32,
    pub stopped_early: bool,
    pub totals: SessionTotals,
}

impl SessionRecord {
    pub fn duration_secs(&self) -> i64 {
        (self.ended_at - self.started_at).num_seconds().max(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub stopped_early_sessions: u64,
    pub total_rounds: u64,
    pub total_work_sec: u64,
    pub total_rest_sec: u64,
}

impl SessionSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a SessionRecord>) -> Self {
        records
            .into_iter()
            .fold(SessionSummary::default(), |mut acc, record| {
                acc.total_sessions += 1;
                if record.stopped_early {
                    acc.stopped_early_sessions += 1;
                } else {
                    acc.completed_sessions += 1;
                }
                acc.total_rounds += u64::from(record.completed_rounds);
                acc.total_work_sec += record.totals.work_time_sec;
                acc.total_rest_sec += record.totals.rest_time_sec;
                acc
            })
    }
}
