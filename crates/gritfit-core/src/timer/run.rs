//! Mutable state of one interval run.
//!
//! A [`Run`] is owned by the timer engine and mutated only through engine
//! operations. Callers get read access through the accessors below.

use serde::{Deserialize, Serialize};

use super::phase::{duration_of, Phase};
use crate::program::{CueSettings, Program};

/// Cumulative time spent per phase category, in milliseconds.
///
/// The countdown is not accounted anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedTotals {
    pub work_ms: u64,
    pub rest_ms: u64,
    pub warmup_ms: u64,
    pub cooldown_ms: u64,
}

impl ElapsedTotals {
    pub(crate) fn credit(&mut self, phase: Phase, ms: u64) {
        let bucket = match phase {
            Phase::Work => &mut self.work_ms,
            Phase::Rest => &mut self.rest_ms,
            Phase::Warmup => &mut self.warmup_ms,
            Phase::Cooldown => &mut self.cooldown_ms,
            Phase::Countdown | Phase::Complete => return,
        };
        *bucket = bucket.saturating_add(ms);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub(crate) program_id: Option<String>,
    pub(crate) program_name: String,
    pub(crate) work_seconds: u32,
    pub(crate) rest_seconds: u32,
    pub(crate) warmup_seconds: u32,
    pub(crate) cooldown_seconds: u32,
    /// `None` for infinite programs.
    pub(crate) rounds_total: Option<u32>,
    pub(crate) rounds_completed: u32,
    pub(crate) phase: Phase,
    /// Wall-clock start of the current phase, shifted forward across pauses.
    pub(crate) phase_started_at: u64,
    pub(crate) phase_duration_ms: u64,
    pub(crate) is_paused: bool,
    pub(crate) paused_at: Option<u64>,
    pub(crate) started_at: u64,
    /// Point up to which elapsed time has been credited.
    pub(crate) last_tick_at: u64,
    pub(crate) elapsed: ElapsedTotals,
    /// Snapshot of the program's cues taken at start.
    pub(crate) settings: CueSettings,
    pub(crate) last_countdown_mark: Option<u32>,
}

impl Run {
    /// Fresh run sitting at the start of its countdown phase.
    ///
    /// The countdown may be zero-length; the engine elides it on start.
    pub(crate) fn new(program: &Program, override_name: Option<&str>, now: u64) -> Self {
        let mut run = Self {
            program_id: program.id.clone(),
            program_name: override_name.unwrap_or(&program.name).to_string(),
            work_seconds: program.work_seconds,
            rest_seconds: program.rest_seconds,
            warmup_seconds: program.warmup_seconds,
            cooldown_seconds: program.cooldown_seconds,
            rounds_total: program.rounds.total(),
            rounds_completed: 0,
            phase: Phase::Countdown,
            phase_started_at: now,
            phase_duration_ms: 0,
            is_paused: false,
            paused_at: None,
            started_at: now,
            last_tick_at: now,
            elapsed: ElapsedTotals::default(),
            settings: program.cues,
            last_countdown_mark: None,
        };
        run.phase_duration_ms = u64::from(duration_of(&run, Phase::Countdown)) * 1000;
        run
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn program_id(&self) -> Option<&str> {
        self.program_id.as_deref()
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn rounds_total(&self) -> Option<u32> {
        self.rounds_total
    }

    pub fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    pub fn is_infinite(&self) -> bool {
        self.rounds_total.is_none()
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_complete()
    }

    pub fn phase_duration_ms(&self) -> u64 {
        self.phase_duration_ms
    }

    pub fn phase_started_at(&self) -> u64 {
        self.phase_started_at
    }

    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    pub fn elapsed(&self) -> ElapsedTotals {
        self.elapsed
    }

    pub fn settings(&self) -> CueSettings {
        self.settings
    }

    /// Time spent in the current phase as of `now`, excluding pauses.
    pub fn phase_elapsed_ms(&self, now: u64) -> u64 {
        let reference = match (self.is_paused, self.paused_at) {
            (true, Some(paused_at)) => paused_at,
            _ => now,
        };
        reference.saturating_sub(self.phase_started_at)
    }

    /// Time left in the current phase as of `now`.
    pub fn remaining_ms(&self, now: u64) -> u64 {
        self.phase_duration_ms
            .saturating_sub(self.phase_elapsed_ms(now))
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self, now: u64) -> f64 {
        if self.phase_duration_ms == 0 {
            return 0.0;
        }
        (self.phase_elapsed_ms(now) as f64 / self.phase_duration_ms as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::RoundLimit;

    #[test]
    fn new_run_snapshots_program() {
        let mut program = Program::quick(40, 20, RoundLimit::Fixed(10)).with_warmup(60);
        let run = Run::new(&program, Some("Morning"), 5_000);
        program.work_seconds = 99;
        program.cues.sound_enabled = false;

        assert_eq!(run.program_name(), "Morning");
        assert_eq!(run.work_seconds, 40);
        assert!(run.settings().sound_enabled);
        assert_eq!(run.phase(), Phase::Countdown);
        assert_eq!(run.phase_duration_ms(), 3_000);
        assert_eq!(run.rounds_total(), Some(10));
    }

    #[test]
    fn remaining_is_frozen_while_paused() {
        let program = Program::quick(40, 20, RoundLimit::Fixed(1));
        let mut run = Run::new(&program, None, 0);
        run.is_paused = true;
        run.paused_at = Some(1_000);
        assert_eq!(run.remaining_ms(1_000), 2_000);
        assert_eq!(run.remaining_ms(50_000), 2_000);
    }

    #[test]
    fn countdown_is_not_accounted() {
        let mut totals = ElapsedTotals::default();
        totals.credit(Phase::Countdown, 3_000);
        totals.credit(Phase::Work, 1_500);
        totals.credit(Phase::Rest, 500);
        assert_eq!(
            totals,
            ElapsedTotals {
                work_ms: 1_500,
                rest_ms: 500,
                ..ElapsedTotals::default()
            }
        );
    }
}
