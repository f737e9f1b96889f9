use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::SessionRecord;
use crate::timer::Phase;

/// Every state change of the interval engine produces an Event.
/// Callers render them, log them, or print them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    RunStarted {
        program_id: Option<String>,
        program_name: String,
        at: DateTime<Utc>,
    },
    PhaseEntered {
        phase: Phase,
        /// 1-based round the phase belongs to.
        round: u32,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    CountdownTick {
        phase: Phase,
        seconds_left: u32,
        at: DateTime<Utc>,
    },
    RunPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    RunResumed {
        remaining_ms: u64,
        paused_ms: u64,
        at: DateTime<Utc>,
    },
    PhaseSkipped {
        from: Phase,
        to: Phase,
        at: DateTime<Utc>,
    },
    PhaseAdjusted {
        phase: Phase,
        duration_ms: u64,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    RunFinished {
        record: SessionRecord,
    },
    /// The tick hit an internal fault; a `RunFinished` with
    /// `stopped_early` follows.
    RunFaulted {
        reason: String,
        at: DateTime<Utc>,
    },
}
