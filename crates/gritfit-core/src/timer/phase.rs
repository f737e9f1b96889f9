//! Phase clock: pure functions over run state.
//!
//! Nothing here mutates. The engine asks `next_phase` where to go and
//! `duration_of` how long to stay there.

use serde::{Deserialize, Serialize};

use super::run::Run;
use crate::program::COUNTDOWN_SECONDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Countdown,
    Warmup,
    Work,
    Rest,
    Cooldown,
    Complete,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Countdown => "Get Ready",
            Phase::Warmup => "Warm-up",
            Phase::Work => "Work",
            Phase::Rest => "Rest",
            Phase::Cooldown => "Cool-down",
            Phase::Complete => "Complete",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Phase::Complete)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Duration of `phase` for this run, in seconds.
pub fn duration_of(run: &Run, phase: Phase) -> u32 {
    match phase {
        Phase::Countdown => {
            if run.settings.countdown_enabled {
                COUNTDOWN_SECONDS
            } else {
                0
            }
        }
        Phase::Warmup => run.warmup_seconds,
        Phase::Work => run.work_seconds,
        Phase::Rest => run.rest_seconds,
        Phase::Cooldown => run.cooldown_seconds,
        Phase::Complete => 0,
    }
}

/// Phase that follows the run's current phase.
///
/// When leaving `Work`, the caller must already have counted the round.
pub fn next_phase(run: &Run) -> Phase {
    next_after(run, run.phase, run.rounds_completed)
}

fn next_after(run: &Run, phase: Phase, rounds_completed: u32) -> Phase {
    match phase {
        Phase::Countdown => {
            if run.warmup_seconds > 0 {
                Phase::Warmup
            } else {
                Phase::Work
            }
        }
        Phase::Warmup => Phase::Work,
        Phase::Work => {
            let finished = run
                .rounds_total
                .is_some_and(|total| rounds_completed >= total);
            if finished {
                if run.cooldown_seconds > 0 {
                    Phase::Cooldown
                } else {
                    Phase::Complete
                }
            } else if run.rest_seconds > 0 {
                Phase::Rest
            } else {
                Phase::Work
            }
        }
        Phase::Rest => Phase::Work,
        Phase::Cooldown => Phase::Complete,
        Phase::Complete => Phase::Complete,
    }
}

/// Next phase the user will actually see, with its duration in seconds.
///
/// Applies the pending round increment when the run is in `Work` and skips
/// zero-duration phases the same way the engine does. `None` once the run
/// is complete.
pub fn preview_next(run: &Run) -> Option<(Phase, u32)> {
    if run.phase.is_complete() {
        return None;
    }
    let mut phase = run.phase;
    let mut completed = run.rounds_completed;
    // Every chain of zero-length phases ends within a handful of steps.
    for _ in 0..8 {
        if phase == Phase::Work {
            completed += 1;
        }
        let next = next_after(run, phase, completed);
        let secs = duration_of(run, next);
        if next.is_complete() || secs > 0 {
            return Some((next, secs));
        }
        phase = next;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{CueSettings, Program, RoundLimit};

    fn run_for(program: &Program) -> Run {
        Run::new(program, None, 0)
    }

    #[test]
    fn countdown_duration_follows_setting() {
        let mut program = Program::quick(20, 10, RoundLimit::Fixed(2));
        assert_eq!(duration_of(&run_for(&program), Phase::Countdown), 3);
        program.cues = CueSettings {
            countdown_enabled: false,
            ..CueSettings::default()
        };
        assert_eq!(duration_of(&run_for(&program), Phase::Countdown), 0);
    }

    #[test]
    fn countdown_goes_to_warmup_only_when_present() {
        let program = Program::quick(20, 10, RoundLimit::Fixed(2));
        let run = run_for(&program);
        assert_eq!(next_after(&run, Phase::Countdown, 0), Phase::Work);

        let run = run_for(&program.with_warmup(30));
        assert_eq!(next_after(&run, Phase::Countdown, 0), Phase::Warmup);
    }

    #[test]
    fn work_goes_to_rest_until_last_round() {
        let run = run_for(&Program::quick(20, 10, RoundLimit::Fixed(3)));
        assert_eq!(next_after(&run, Phase::Work, 1), Phase::Rest);
        assert_eq!(next_after(&run, Phase::Work, 2), Phase::Rest);
        assert_eq!(next_after(&run, Phase::Work, 3), Phase::Complete);
    }

    #[test]
    fn last_round_goes_to_cooldown_when_present() {
        let run = run_for(&Program::quick(20, 10, RoundLimit::Fixed(1)).with_cooldown(30));
        assert_eq!(next_after(&run, Phase::Work, 1), Phase::Cooldown);
        assert_eq!(next_after(&run, Phase::Cooldown, 1), Phase::Complete);
    }

    #[test]
    fn zero_rest_returns_straight_to_work() {
        let run = run_for(&Program::quick(60, 0, RoundLimit::Fixed(10)));
        assert_eq!(next_after(&run, Phase::Work, 4), Phase::Work);
    }

    #[test]
    fn infinite_never_completes_on_rounds() {
        let run = run_for(&Program::quick(45, 15, RoundLimit::Infinite));
        assert_eq!(next_after(&run, Phase::Work, 10_000), Phase::Rest);
    }

    #[test]
    fn complete_is_terminal() {
        let run = run_for(&Program::quick(45, 15, RoundLimit::Fixed(1)));
        assert_eq!(next_after(&run, Phase::Complete, 1), Phase::Complete);
    }

    #[test]
    fn preview_skips_zero_length_warmup() {
        let run = run_for(&Program::quick(40, 20, RoundLimit::Fixed(2)));
        assert_eq!(run.phase, Phase::Countdown);
        assert_eq!(preview_next(&run), Some((Phase::Work, 40)));
    }

    #[test]
    fn preview_from_last_work_shows_finish() {
        let mut run = run_for(&Program::quick(40, 20, RoundLimit::Fixed(2)));
        run.phase = Phase::Work;
        run.rounds_completed = 1;
        assert_eq!(preview_next(&run), Some((Phase::Complete, 0)));
        run.rounds_completed = 0;
        assert_eq!(preview_next(&run), Some((Phase::Rest, 20)));
    }
}
