//! Interval program definitions.
//!
//! A [`Program`] describes the shape of an interval workout. It is read-only
//! input to the timer engine: the engine copies what it needs at start and
//! never looks at the source program again.

mod presets;

pub use presets::{builtin_programs, find_builtin, preset_ids};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Length of the countdown phase when countdown cues are enabled.
pub const COUNTDOWN_SECONDS: u32 = 3;

/// Per-program cue settings. Each flag is independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueSettings {
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
    #[serde(default = "default_true")]
    pub countdown_enabled: bool,
    #[serde(default = "default_true")]
    pub keep_awake_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CueSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            vibration_enabled: true,
            countdown_enabled: true,
            keep_awake_enabled: true,
        }
    }
}

/// How many rounds a program runs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "count", rename_all = "lowercase")]
pub enum RoundLimit {
    Fixed(u32),
    /// Never completes on rounds; must be stopped.
    Infinite,
}

impl RoundLimit {
    pub fn is_infinite(&self) -> bool {
        matches!(self, RoundLimit::Infinite)
    }

    /// Fixed round count, `None` when infinite.
    pub fn total(&self) -> Option<u32> {
        match self {
            RoundLimit::Fixed(n) => Some(*n),
            RoundLimit::Infinite => None,
        }
    }
}

/// Workout shape consumed by the timer engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// `None` for ad-hoc quick-start programs that were never saved.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub work_seconds: u32,
    #[serde(default)]
    pub rest_seconds: u32,
    pub rounds: RoundLimit,
    #[serde(default)]
    pub warmup_seconds: u32,
    #[serde(default)]
    pub cooldown_seconds: u32,
    #[serde(default)]
    pub cues: CueSettings,
    #[serde(default)]
    pub is_built_in: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Program {
    /// Ad-hoc program with no warm-up or cool-down.
    pub fn quick(work_seconds: u32, rest_seconds: u32, rounds: RoundLimit) -> Self {
        Self {
            id: None,
            name: "Quick Start".to_string(),
            category: "custom".to_string(),
            description: String::new(),
            work_seconds,
            rest_seconds,
            rounds,
            warmup_seconds: 0,
            cooldown_seconds: 0,
            cues: CueSettings::default(),
            is_built_in: false,
            is_favorite: false,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_warmup(mut self, seconds: u32) -> Self {
        self.warmup_seconds = seconds;
        self
    }

    pub fn with_cooldown(mut self, seconds: u32) -> Self {
        self.cooldown_seconds = seconds;
        self
    }

    pub fn with_cues(mut self, cues: CueSettings) -> Self {
        self.cues = cues;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Check the timing invariants the engine depends on.
    ///
    /// # Errors
    /// Returns an error if `work_seconds` is zero or a fixed round count is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.work_seconds == 0 {
            return Err(ValidationError::InvalidValue {
                field: "work_seconds".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.rounds == RoundLimit::Fixed(0) {
            return Err(ValidationError::InvalidValue {
                field: "rounds".into(),
                message: "must be at least 1 unless the program is infinite".into(),
            });
        }
        Ok(())
    }

    /// Total wall-clock length of a finite run, countdown included.
    ///
    /// The last round has no trailing rest. `None` for infinite programs.
    pub fn planned_duration_secs(&self) -> Option<u64> {
        let rounds = u64::from(self.rounds.total()?);
        let countdown = if self.cues.countdown_enabled {
            u64::from(COUNTDOWN_SECONDS)
        } else {
            0
        };
        Some(
            countdown
                + u64::from(self.warmup_seconds)
                + rounds * u64::from(self.work_seconds)
                + rounds.saturating_sub(1) * u64::from(self.rest_seconds)
                + u64::from(self.cooldown_seconds),
        )
    }

    /// Short human-readable shape, e.g. `40s/20s x10`.
    pub fn shape_label(&self) -> String {
        let rounds = match self.rounds {
            RoundLimit::Fixed(n) => format!("x{n}"),
            RoundLimit::Infinite => "x∞".to_string(),
        };
        format!("{}s/{}s {}", self.work_seconds, self.rest_seconds, rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_work_is_rejected() {
        let program = Program::quick(0, 10, RoundLimit::Fixed(3));
        assert!(program.validate().is_err());
    }

    #[test]
    fn zero_rounds_is_rejected_unless_infinite() {
        assert!(Program::quick(20, 10, RoundLimit::Fixed(0)).validate().is_err());
        assert!(Program::quick(20, 10, RoundLimit::Infinite).validate().is_ok());
    }

    #[test]
    fn planned_duration_drops_trailing_rest() {
        let program = Program::quick(40, 20, RoundLimit::Fixed(10))
            .with_warmup(60)
            .with_cooldown(60);
        assert_eq!(program.planned_duration_secs(), Some(3 + 60 + 580 + 60));
    }

    #[test]
    fn planned_duration_is_none_for_infinite() {
        let program = Program::quick(45, 15, RoundLimit::Infinite);
        assert_eq!(program.planned_duration_secs(), None);
    }

    #[test]
    fn round_limit_serializes_tagged() {
        let json = serde_json::to_string(&RoundLimit::Fixed(8)).unwrap();
        assert_eq!(json, r#"{"mode":"fixed","count":8}"#);
        let parsed: RoundLimit = serde_json::from_str(r#"{"mode":"infinite"}"#).unwrap();
        assert!(parsed.is_infinite());
    }
}
