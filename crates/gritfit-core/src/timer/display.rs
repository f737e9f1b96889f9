//! Read-only projection of a run for rendering.

use serde::{Deserialize, Serialize};

use super::phase::{preview_next, Phase};
use super::run::Run;

/// State of the display wake lock as seen by the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WakeLockStatus {
    pub held: bool,
    pub unsupported: bool,
}

/// Snapshot recomputed from run state on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayProjection {
    pub phase: Phase,
    pub phase_label: String,
    pub remaining_seconds_ceil: u64,
    /// "Round N of M" or "Round N of ∞".
    pub round_meta: String,
    pub next_up_preview: String,
    pub keep_awake_label: String,
    pub is_paused: bool,
    /// 0.0 .. 1.0 progress within the current phase.
    pub phase_progress: f64,
}

/// 1-based round the current phase belongs to.
///
/// A rest belongs to the round that just finished. Never below 1.
pub fn current_round(run: &Run) -> u32 {
    let completed = run.rounds_completed();
    match run.phase() {
        Phase::Countdown | Phase::Warmup => 1,
        Phase::Work => completed + 1,
        Phase::Rest | Phase::Cooldown | Phase::Complete => completed.max(1),
    }
}

/// Format whole seconds as `m:ss`.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn project(run: &Run, now: u64, wake_lock: WakeLockStatus) -> DisplayProjection {
    let remaining_ms = run.remaining_ms(now);
    let round_meta = match run.rounds_total() {
        Some(total) => format!("Round {} of {}", current_round(run), total),
        None => format!("Round {} of ∞", current_round(run)),
    };
    let next_up_preview = match preview_next(run) {
        Some((Phase::Complete, _)) => "Next: Finish".to_string(),
        Some((phase, secs)) => format!("Next: {} {}", phase.label(), format_clock(u64::from(secs))),
        None => String::new(),
    };
    let keep_awake_label = if !run.settings().keep_awake_enabled {
        "Screen may sleep"
    } else if wake_lock.held {
        "Screen kept awake"
    } else if wake_lock.unsupported {
        "Keep awake unavailable"
    } else {
        "Keep awake off"
    };

    DisplayProjection {
        phase: run.phase(),
        phase_label: run.phase().label().to_string(),
        remaining_seconds_ceil: remaining_ms.div_ceil(1000),
        round_meta,
        next_up_preview,
        keep_awake_label: keep_awake_label.to_string(),
        is_paused: run.is_paused() && !run.is_complete(),
        phase_progress: run.phase_progress(now),
    }
}
