//! Interval engine implementation.
//!
//! The engine is a wall-clock-based state machine. It does not use internal
//! threads: every operation reads the injected [`Clock`] and the host calls
//! `tick()` whenever the [`TickScheduler`] callback fires.
//!
//! ## Phase flow
//!
//! ```text
//! Countdown -> [Warmup] -> Work -> [Rest -> Work]* -> [Cooldown] -> Complete
//! ```
//!
//! Phase boundaries are computed from phase start times, never from tick
//! counts. A late tick walks every boundary it missed and anchors each new
//! phase at the exact instant the previous one ended, so the schedule cannot
//! drift no matter how irregular the callbacks are.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = IntervalEngine::new(Box::new(MemoryStore::new()));
//! engine.start(&program, None)?;
//! // Whenever the scheduler fires:
//! for event in engine.tick() { render(&event); }
//! ```

use thiserror::Error;
use uuid::Uuid;

use super::clock::{to_datetime, Clock, PollScheduler, SystemClock, TickScheduler};
use super::display::{current_round, project, DisplayProjection, WakeLockStatus};
use super::phase::{duration_of, next_phase, Phase};
use super::run::Run;
use crate::cues::{Cue, CueDispatcher, CueSink};
use crate::error::EngineError;
use crate::events::Event;
use crate::program::{Program, COUNTDOWN_SECONDS};
use crate::storage::{SessionRecord, SessionStore, SessionTotals};
use crate::wake_lock::{WakeLockHost, WakeLockManager};

/// Shortest duration a phase can be adjusted down to.
pub const MIN_PHASE_MS: u64 = 1_000;

/// Zero-length phases entered back to back before the run is abandoned.
const MAX_ELIDED_PHASES: usize = 6;

/// Boundaries a single tick may cross. Only a wildly wrong clock gets here.
const MAX_CATCH_UP_TRANSITIONS: usize = 100_000;

/// Internal inconsistencies detected while advancing.
#[derive(Debug, Error)]
enum TickFault {
    #[error("zero-length phases did not settle after {0} steps")]
    ElisionLoop(usize),

    #[error("round counter {completed} exceeded program total {total}")]
    RoundOverflow { completed: u32, total: u32 },

    #[error("more than {0} phase boundaries crossed in one tick")]
    CatchUpOverflow(usize),
}

/// Drives one interval run at a time.
///
/// Host facilities are injected as ports at construction. Every port has a
/// no-op default, so a bare engine only needs somewhere to put finished
/// sessions.
pub struct IntervalEngine {
    run: Option<Run>,
    clock: Box<dyn Clock>,
    scheduler: Box<dyn TickScheduler>,
    cues: CueDispatcher,
    wake_lock: WakeLockManager,
    sessions: Box<dyn SessionStore>,
    hidden: bool,
}

impl IntervalEngine {
    pub fn new(sessions: Box<dyn SessionStore>) -> Self {
        Self {
            run: None,
            clock: Box::new(SystemClock),
            scheduler: Box::new(PollScheduler::new()),
            cues: CueDispatcher::silent(),
            wake_lock: WakeLockManager::unsupported(),
            sessions,
            hidden: false,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_scheduler(mut self, scheduler: impl TickScheduler + 'static) -> Self {
        self.scheduler = Box::new(scheduler);
        self
    }

    pub fn with_cue_sink(mut self, sink: impl CueSink + 'static) -> Self {
        self.cues = CueDispatcher::new(Box::new(sink));
        self
    }

    pub fn with_wake_lock_host(mut self, host: impl WakeLockHost + 'static) -> Self {
        self.wake_lock = WakeLockManager::new(Box::new(host));
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Current or last finished run.
    pub fn run(&self) -> Option<&Run> {
        self.run.as_ref()
    }

    /// A run exists, is not paused and has not finished.
    pub fn is_running(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| !run.is_paused() && !run.is_complete())
    }

    /// A run exists and has not finished.
    pub fn is_live(&self) -> bool {
        self.run.as_ref().is_some_and(|run| !run.is_complete())
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn wake_lock_status(&self) -> WakeLockStatus {
        WakeLockStatus {
            held: self.wake_lock.is_held(),
            unsupported: self.wake_lock.is_unsupported(),
        }
    }

    pub fn display(&self) -> Option<DisplayProjection> {
        let run = self.run.as_ref()?;
        Some(project(run, self.clock.now_ms(), self.wake_lock_status()))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a run of `program`, optionally under a different display name.
    ///
    /// A finished run is replaced. A live one is left alone.
    pub fn start(
        &mut self,
        program: &Program,
        name_override: Option<&str>,
    ) -> Result<Vec<Event>, EngineError> {
        program.validate()?;
        if self.is_live() {
            return Err(EngineError::RunInProgress);
        }

        let now = self.clock.now_ms();
        let run = Run::new(program, name_override, now);
        tracing::info!(
            program = %run.program_name(),
            shape = %program.shape_label(),
            "interval run started"
        );
        let mut events = vec![Event::RunStarted {
            program_id: run.program_id.clone(),
            program_name: run.program_name.clone(),
            at: to_datetime(now),
        }];
        let keep_awake = run.settings.keep_awake_enabled;
        let has_countdown = run.phase_duration_ms > 0;
        self.run = Some(run);

        if has_countdown {
            self.announce_phase(now, &mut events);
        } else if let Err(fault) = self.advance(now, &mut events) {
            self.fault(now, fault, &mut events);
            return Ok(events);
        }

        if !self.hidden {
            self.wake_lock.acquire(keep_awake);
        }
        self.scheduler.schedule_next();
        Ok(events)
    }

    /// Process elapsed wall-clock time. Called on every scheduler callback.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        self.tick_at(now)
    }

    /// Freeze the current phase. Time up to now is accounted first; if that
    /// finishes the run there is nothing left to pause.
    pub fn pause(&mut self) -> Vec<Event> {
        if !self.is_running() {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let mut events = self.tick_at(now);

        let Some(run) = self.run.as_mut() else {
            return events;
        };
        if run.is_complete() {
            return events;
        }
        run.is_paused = true;
        run.paused_at = Some(now);
        let remaining_ms = run.remaining_ms(now);
        self.wake_lock.release();
        tracing::info!(remaining_ms, "interval run paused");
        events.push(Event::RunPaused {
            remaining_ms,
            at: to_datetime(now),
        });
        events
    }

    /// Continue a paused run. The paused span is excluded from the phase.
    pub fn resume(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let Some(run) = self.run.as_mut() else {
            return Vec::new();
        };
        if run.is_complete() || !run.is_paused {
            return Vec::new();
        }

        let paused_ms = now.saturating_sub(run.paused_at.unwrap_or(now));
        run.phase_started_at = run.phase_started_at.saturating_add(paused_ms);
        run.last_tick_at = now;
        run.is_paused = false;
        run.paused_at = None;
        let remaining_ms = run.remaining_ms(now);
        let keep_awake = run.settings.keep_awake_enabled;

        if !self.hidden {
            self.wake_lock.acquire(keep_awake);
        }
        self.scheduler.schedule_next();
        tracing::info!(remaining_ms, paused_ms, "interval run resumed");
        vec![Event::RunResumed {
            remaining_ms,
            paused_ms,
            at: to_datetime(now),
        }]
    }

    /// End the current phase immediately.
    ///
    /// Time since the last tick is dropped rather than credited. A paused
    /// run stays paused with the new phase at full length.
    pub fn skip(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let Some(run) = self.run.as_mut() else {
            return Vec::new();
        };
        if run.is_complete() {
            return Vec::new();
        }
        let from = run.phase;
        let was_paused = run.is_paused;
        run.last_tick_at = now;

        let mut entered = Vec::new();
        if let Err(fault) = self.advance(now, &mut entered) {
            self.fault(now, fault, &mut entered);
        }

        let to = match self.run.as_mut() {
            Some(run) => {
                if was_paused && !run.is_complete() {
                    run.paused_at = Some(now);
                }
                run.phase
            }
            None => Phase::Complete,
        };
        tracing::debug!(%from, %to, "phase skipped");

        let mut events = vec![Event::PhaseSkipped {
            from,
            to,
            at: to_datetime(now),
        }];
        events.extend(entered);
        events
    }

    /// Lengthen or shorten the current phase by `delta_secs`.
    ///
    /// The phase never drops below [`MIN_PHASE_MS`]; shortening past the
    /// time already spent ends the phase on the next tick.
    pub fn adjust(&mut self, delta_secs: i64) -> Vec<Event> {
        let now = self.clock.now_ms();
        let Some(run) = self.run.as_mut() else {
            return Vec::new();
        };
        if run.is_complete() || delta_secs == 0 {
            return Vec::new();
        }

        let current = i64::try_from(run.phase_duration_ms).unwrap_or(i64::MAX);
        let adjusted = current
            .saturating_add(delta_secs.saturating_mul(1000))
            .max(MIN_PHASE_MS as i64);
        run.phase_duration_ms = adjusted.unsigned_abs();
        run.last_countdown_mark = None;
        let remaining_ms = run.remaining_ms(now);
        tracing::debug!(
            phase = %run.phase,
            delta_secs,
            duration_ms = run.phase_duration_ms,
            "phase adjusted"
        );
        vec![Event::PhaseAdjusted {
            phase: run.phase,
            duration_ms: run.phase_duration_ms,
            remaining_ms,
            at: to_datetime(now),
        }]
    }

    /// End the run early and record it. Ignored unless `confirmed`.
    pub fn stop(&mut self, confirmed: bool) -> Vec<Event> {
        if !confirmed || !self.is_live() {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let mut events = Vec::new();

        if self.is_running() {
            if let Err(fault) = self.catch_up(now, &mut events) {
                self.fault(now, fault, &mut events);
                return events;
            }
        }
        if self.is_live() {
            tracing::info!("interval run stopped early");
            self.finalize(now, true, &mut events);
        }
        events
    }

    /// Host surface visibility changed.
    ///
    /// Hosts drop wake locks while hidden; becoming visible re-acquires it
    /// for a running run and catches the display up.
    pub fn on_visibility_change(&mut self, visible: bool) -> Vec<Event> {
        self.hidden = !visible;
        if !visible {
            self.wake_lock.mark_lost();
            return Vec::new();
        }
        let Some(run) = self.run.as_ref() else {
            return Vec::new();
        };
        if run.is_paused || run.is_complete() {
            return Vec::new();
        }
        self.wake_lock.acquire(run.settings.keep_awake_enabled);
        self.tick()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn tick_at(&mut self, now: u64) -> Vec<Event> {
        let mut events = Vec::new();
        match self.run.as_ref() {
            None => return events,
            Some(run) if run.is_complete() => return events,
            Some(run) if run.is_paused => {
                self.scheduler.schedule_next();
                return events;
            }
            Some(_) => {}
        }

        if let Err(fault) = self.catch_up(now, &mut events) {
            self.fault(now, fault, &mut events);
            return events;
        }
        self.countdown_cue(now, &mut events);

        if self.is_live() {
            self.scheduler.schedule_next();
        }
        events
    }

    /// Credit elapsed time and cross every boundary at or before `now`.
    ///
    /// Each boundary is credited to the phase it closes, and the next phase
    /// starts exactly at that boundary.
    fn catch_up(&mut self, now: u64, events: &mut Vec<Event>) -> Result<(), TickFault> {
        let mut transitions = 0;
        loop {
            let Some(run) = self.run.as_mut() else {
                return Ok(());
            };
            if run.is_complete() {
                return Ok(());
            }

            let credited_to = run.last_tick_at;
            // An adjust can pull the boundary behind time already credited.
            let boundary = run
                .phase_started_at
                .saturating_add(run.phase_duration_ms)
                .max(credited_to);
            if now < boundary {
                run.elapsed.credit(run.phase, now.saturating_sub(credited_to));
                run.last_tick_at = now.max(credited_to);
                return Ok(());
            }

            run.elapsed.credit(run.phase, boundary - credited_to);
            run.last_tick_at = boundary;
            transitions += 1;
            if transitions > MAX_CATCH_UP_TRANSITIONS {
                return Err(TickFault::CatchUpOverflow(MAX_CATCH_UP_TRANSITIONS));
            }
            self.advance(boundary, events)?;
        }
    }

    /// Leave the current phase, entering the next one at `anchor`.
    fn advance(&mut self, anchor: u64, events: &mut Vec<Event>) -> Result<(), TickFault> {
        for _ in 0..MAX_ELIDED_PHASES {
            let Some(run) = self.run.as_mut() else {
                return Ok(());
            };
            if run.phase == Phase::Work {
                run.rounds_completed = run.rounds_completed.saturating_add(1);
                if let Some(total) = run.rounds_total {
                    if run.rounds_completed > total {
                        return Err(TickFault::RoundOverflow {
                            completed: run.rounds_completed,
                            total,
                        });
                    }
                }
            }

            let next = next_phase(run);
            if next.is_complete() {
                self.finalize(anchor, false, events);
                return Ok(());
            }

            run.phase = next;
            run.phase_started_at = anchor;
            run.phase_duration_ms = u64::from(duration_of(run, next)) * 1000;
            run.last_countdown_mark = None;
            if run.phase_duration_ms > 0 {
                self.announce_phase(anchor, events);
                return Ok(());
            }
            tracing::debug!(phase = %next, "skipping zero-length phase");
        }
        Err(TickFault::ElisionLoop(MAX_ELIDED_PHASES))
    }

    fn announce_phase(&mut self, at: u64, events: &mut Vec<Event>) {
        let Some(run) = self.run.as_ref() else {
            return;
        };
        let round = current_round(run);
        self.cues.dispatch(Cue::for_phase(run.phase), &run.settings);
        tracing::debug!(phase = %run.phase, round, "phase entered");
        events.push(Event::PhaseEntered {
            phase: run.phase,
            round,
            duration_secs: u32::try_from(run.phase_duration_ms / 1000).unwrap_or(u32::MAX),
            at: to_datetime(at),
        });
    }

    /// Fire a 3-2-1 tick once per whole second in the final seconds.
    fn countdown_cue(&mut self, now: u64, events: &mut Vec<Event>) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        if run.is_complete() || run.is_paused || !run.settings.countdown_enabled {
            return;
        }
        let remaining = run.remaining_ms(now);
        if remaining == 0 || remaining > u64::from(COUNTDOWN_SECONDS) * 1000 {
            return;
        }
        // remaining is at most COUNTDOWN_SECONDS here.
        let seconds_left = remaining.div_ceil(1000) as u32;
        if run.last_countdown_mark == Some(seconds_left) {
            return;
        }
        run.last_countdown_mark = Some(seconds_left);
        self.cues.dispatch(Cue::CountdownTick, &run.settings);
        events.push(Event::CountdownTick {
            phase: run.phase,
            seconds_left,
            at: to_datetime(now),
        });
    }

    fn fault(&mut self, now: u64, fault: TickFault, events: &mut Vec<Event>) {
        tracing::error!(error = %fault, "interval run faulted, stopping");
        events.push(Event::RunFaulted {
            reason: fault.to_string(),
            at: to_datetime(now),
        });
        self.finalize(now, true, events);
    }

    /// Move the run to `Complete`, release host resources and write the
    /// session record. Storage failures are logged, never raised.
    fn finalize(&mut self, ended_at: u64, stopped_early: bool, events: &mut Vec<Event>) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        if run.is_complete() {
            return;
        }
        run.phase = Phase::Complete;
        run.phase_started_at = ended_at;
        run.phase_duration_ms = 0;
        run.is_paused = true;
        run.paused_at = Some(ended_at);
        run.last_countdown_mark = None;

        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            program_id: run.program_id.clone(),
            program_name: run.program_name.clone(),
            started_at: to_datetime(run.started_at),
            ended_at: to_datetime(ended_at),
            completed_rounds: run.rounds_completed,
            stopped_early,
            totals: SessionTotals {
                work_time_sec: ms_to_secs(run.elapsed.work_ms),
                rest_time_sec: ms_to_secs(run.elapsed.rest_ms),
                warmup_time_sec: ms_to_secs(run.elapsed.warmup_ms),
                cooldown_time_sec: ms_to_secs(run.elapsed.cooldown_ms),
            },
        };

        self.wake_lock.release();
        self.scheduler.cancel();
        tracing::info!(
            program = %record.program_name,
            rounds = record.completed_rounds,
            stopped_early,
            "interval run finished"
        );
        if let Err(e) = self.sessions.save_session(&record) {
            tracing::warn!(error = %e, session = %record.id, "failed to save interval session");
        }
        events.push(Event::RunFinished { record });
    }
}

impl std::fmt::Debug for IntervalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalEngine")
            .field("run", &self.run)
            .field("wake_lock", &self.wake_lock)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

/// Round to the nearest whole second.
fn ms_to_secs(ms: u64) -> u64 {
    ms.saturating_add(500) / 1000
}
