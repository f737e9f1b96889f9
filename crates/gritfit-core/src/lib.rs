//! # GritFit Core Library
//!
//! This library provides the core logic for the GritFit interval timer.
//! The `gritfit` CLI is a thin host over the same library: it supplies the
//! clock, the tick loop and the terminal cues, and everything else lives here.
//!
//! ## Architecture
//!
//! - **Interval Engine**: A wall-clock-based state machine. The host invokes
//!   `tick()` whenever its scheduler fires; phase boundaries never depend on
//!   how often that happens
//! - **Programs**: Interval program definitions and the built-in presets
//! - **Storage**: SQLite-based program and session storage, an in-memory
//!   store for ephemeral hosts and tests, and TOML-based configuration
//! - **Host ports**: Clock, tick scheduler, cue sink and wake lock traits
//!   with no-op fallbacks
//!
//! ## Key Components
//!
//! - [`IntervalEngine`]: Core interval state machine
//! - [`Program`]: What the engine runs
//! - [`Database`]: Program and session persistence
//! - [`Config`]: Application configuration management

pub mod cues;
pub mod error;
pub mod events;
pub mod program;
pub mod storage;
pub mod timer;
pub mod wake_lock;

pub use cues::{Cue, CueSink, NullCueSink};
pub use error::{ConfigError, CoreError, DatabaseError, EngineError, ValidationError};
pub use events::Event;
pub use program::{CueSettings, Program, RoundLimit};
pub use storage::{Config, Database, MemoryStore, ProgramStore, SessionRecord, SessionStore};
pub use timer::{DisplayProjection, IntervalEngine, Phase, Run};
pub use wake_lock::{NoWakeLock, WakeLockHost};
