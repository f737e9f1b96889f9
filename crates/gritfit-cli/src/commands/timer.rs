//! Terminal host for the interval engine.
//!
//! A single-threaded tokio runtime plays the role of the cooperative
//! scheduler: the engine requests a callback at the end of every tick and
//! the loop below honours it on the next interval tick. Single-key commands
//! are read line by line from stdin. Ctrl-C stops the run and records it.

use std::io::Write;
use std::time::Duration;

use clap::{Args, Subcommand};
use gritfit_core::storage::SessionStore;
use gritfit_core::timer::{format_clock, PollScheduler};
use gritfit_core::{
    Config, CueSink, Database, Event, IntervalEngine, MemoryStore, Program, RoundLimit,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use super::{parse_rounds, program::load, CueArgs};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a saved program or built-in preset
    Run {
        /// Program ID (e.g. "preset-tabata")
        id: String,
        /// Name to record the session under
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        opts: RunOptions,
    },
    /// Run an ad-hoc program
    Quick {
        /// Work phase length in seconds
        #[arg(long)]
        work: u32,
        /// Rest phase length in seconds (0 skips rest)
        #[arg(long, default_value = "0")]
        rest: u32,
        /// Number of rounds, or "inf"
        #[arg(long, default_value = "8", value_parser = parse_rounds)]
        rounds: RoundLimit,
        #[arg(long, default_value = "0")]
        warmup: u32,
        #[arg(long, default_value = "0")]
        cooldown: u32,
        #[command(flatten)]
        cues: CueArgs,
        #[command(flatten)]
        opts: RunOptions,
    },
}

#[derive(Args, Debug)]
pub struct RunOptions {
    /// Print every event as a JSON line
    #[arg(long)]
    json: bool,
    /// Do not record the session
    #[arg(long)]
    ephemeral: bool,
    /// Ignore stdin; the run ends on its own or on Ctrl-C
    #[arg(long)]
    no_input: bool,
}

const HELP: &str = "keys: p pause, r resume, s skip, + / - adjust, v hide/show, q stop";

/// Rings the terminal bell for tones. Vibration has no terminal equivalent.
struct TerminalCueSink {
    bell: bool,
}

impl CueSink for TerminalCueSink {
    fn play_tone(&mut self, frequency_hz: f32, duration_sec: f32) {
        tracing::trace!(frequency_hz, duration_sec, "tone");
        if self.bell {
            // stderr keeps JSON output on stdout clean.
            eprint!("\x07");
        }
    }

    fn vibrate(&mut self, pattern_ms: &[u32]) {
        tracing::trace!(?pattern_ms, "vibration not available in terminal");
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    match action {
        TimerAction::Run { id, name, opts } => {
            let program = load(&Database::open()?, &id)?;
            run_program(&config, &program, name.as_deref(), opts)
        }
        TimerAction::Quick {
            work,
            rest,
            rounds,
            warmup,
            cooldown,
            cues,
            opts,
        } => {
            let mut program = Program::quick(work, rest, rounds)
                .with_warmup(warmup)
                .with_cooldown(cooldown)
                .with_cues(config.cues);
            cues.apply(&mut program.cues);
            run_program(&config, &program, None, opts)
        }
    }
}

fn run_program(
    config: &Config,
    program: &Program,
    name: Option<&str>,
    opts: RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    if opts.no_input && program.rounds.is_infinite() {
        return Err("an infinite program cannot run with --no-input".into());
    }
    let sessions: Box<dyn SessionStore> = if opts.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(Database::open()?)
    };
    let scheduler = PollScheduler::new();
    let mut engine = IntervalEngine::new(sessions)
        .with_scheduler(scheduler.clone())
        .with_cue_sink(TerminalCueSink {
            bell: config.terminal.bell,
        });
    let mut out = Output {
        json: opts.json || config.terminal.json,
        status_shown: false,
    };

    let events = engine.start(program, name)?;
    out.events(&events)?;
    if !out.json && !opts.no_input {
        eprintln!("{HELP}");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()?;
    runtime.block_on(host_loop(
        &mut engine,
        &scheduler,
        &mut out,
        config,
        !opts.no_input,
    ))
}

async fn host_loop(
    engine: &mut IntervalEngine,
    scheduler: &PollScheduler,
    out: &mut Output,
    config: &Config,
    read_input: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ticker = tokio::time::interval(Duration::from_millis(config.timer.tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = read_input;
    let mut confirming_stop = false;
    let mut hidden = false;
    let step = i64::from(config.timer.adjust_step_secs);
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    while engine.is_live() {
        tokio::select! {
            signal = &mut interrupt => {
                signal?;
                tracing::info!("interrupted, stopping run");
                let events = engine.stop(true);
                out.events(&events)?;
            }
            _ = ticker.tick() => {
                if scheduler.take_pending() {
                    let events = engine.tick();
                    out.events(&events)?;
                    out.status(engine)?;
                }
            }
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    tracing::debug!("stdin closed, commands disabled");
                    input_open = false;
                    continue;
                };
                let command = line.trim();
                let events = if confirming_stop {
                    confirming_stop = false;
                    engine.stop(matches!(command, "y" | "yes"))
                } else {
                    match command {
                        "p" => engine.pause(),
                        "r" => engine.resume(),
                        "s" => engine.skip(),
                        "+" => engine.adjust(step),
                        "-" => engine.adjust(-step),
                        "v" => {
                            hidden = !hidden;
                            engine.on_visibility_change(!hidden)
                        }
                        "q" => {
                            confirming_stop = true;
                            eprintln!("stop this run? (y/n)");
                            Vec::new()
                        }
                        "" => Vec::new(),
                        other => {
                            eprintln!("unknown command '{other}'; {HELP}");
                            Vec::new()
                        }
                    }
                };
                out.events(&events)?;
                out.status(engine)?;
            }
        }
    }
    Ok(())
}

struct Output {
    json: bool,
    status_shown: bool,
}

impl Output {
    fn events(&mut self, events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
        let mut stdout = std::io::stdout().lock();
        for event in events {
            if self.json {
                writeln!(stdout, "{}", serde_json::to_string(event)?)?;
                continue;
            }
            let Some(line) = describe(event) else {
                continue;
            };
            if self.status_shown {
                write!(stdout, "\r\x1b[2K")?;
                self.status_shown = false;
            }
            writeln!(stdout, "{line}")?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Redraw the single status line. Nothing in JSON mode.
    fn status(&mut self, engine: &IntervalEngine) -> Result<(), Box<dyn std::error::Error>> {
        if self.json || !engine.is_live() {
            return Ok(());
        }
        let Some(view) = engine.display() else {
            return Ok(());
        };
        let paused = if view.is_paused { "  [paused]" } else { "" };
        let mut stdout = std::io::stdout().lock();
        write!(
            stdout,
            "\r\x1b[2K{:<10} {:>6}  {}  {}  {}{paused}",
            view.phase_label,
            format_clock(view.remaining_seconds_ceil),
            view.round_meta,
            view.next_up_preview,
            view.keep_awake_label,
        )?;
        stdout.flush()?;
        self.status_shown = true;
        Ok(())
    }
}

fn describe(event: &Event) -> Option<String> {
    match event {
        Event::RunStarted { program_name, .. } => Some(format!("Starting {program_name}")),
        Event::PhaseEntered {
            phase,
            round,
            duration_secs,
            ..
        } => Some(format!(
            "{phase} {} (round {round})",
            format_clock(u64::from(*duration_secs))
        )),
        Event::CountdownTick { .. } => None,
        Event::RunPaused { .. } => Some("Paused".to_string()),
        Event::RunResumed { .. } => Some("Resumed".to_string()),
        Event::PhaseSkipped { from, to, .. } => Some(format!("Skipped {from} -> {to}")),
        Event::PhaseAdjusted {
            phase, duration_ms, ..
        } => Some(format!(
            "{phase} is now {}",
            format_clock(duration_ms / 1000)
        )),
        Event::RunFinished { record } => {
            let how = if record.stopped_early {
                "Stopped"
            } else {
                "Finished"
            };
            Some(format!(
                "{how} {}: {} rounds, work {}, rest {}",
                record.program_name,
                record.completed_rounds,
                format_clock(record.totals.work_time_sec),
                format_clock(record.totals.rest_time_sec),
            ))
        }
        Event::RunFaulted { reason, .. } => Some(format!("Run aborted: {reason}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gritfit_core::storage::{SessionRecord, SessionTotals};
    use gritfit_core::Phase;

    #[test]
    fn countdown_ticks_are_not_printed() {
        let event = Event::CountdownTick {
            phase: Phase::Work,
            seconds_left: 2,
            at: chrono::Utc::now(),
        };
        assert!(describe(&event).is_none());
    }

    #[test]
    fn finished_run_summary() {
        let now = chrono::Utc::now();
        let event = Event::RunFinished {
            record: SessionRecord {
                id: "s1".into(),
                program_id: None,
                program_name: "Quick Start".into(),
                started_at: now,
                ended_at: now,
                completed_rounds: 3,
                stopped_early: true,
                totals: SessionTotals {
                    work_time_sec: 90,
                    rest_time_sec: 30,
                    ..SessionTotals::default()
                },
            },
        };
        assert_eq!(
            describe(&event).as_deref(),
            Some("Stopped Quick Start: 3 rounds, work 1:30, rest 0:30")
        );
    }

    #[test]
    fn phase_entry_line() {
        let event = Event::PhaseEntered {
            phase: Phase::Rest,
            round: 2,
            duration_secs: 20,
            at: chrono::Utc::now(),
        };
        assert_eq!(describe(&event).as_deref(), Some("Rest 0:20 (round 2)"));
    }
}
