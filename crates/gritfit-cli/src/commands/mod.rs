pub mod config;
pub mod program;
pub mod session;
pub mod timer;

use clap::Args;
use gritfit_core::{CueSettings, RoundLimit};

/// Parse a round count; `inf` or `infinite` means no limit.
pub fn parse_rounds(value: &str) -> Result<RoundLimit, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "inf" | "infinite" | "∞" => Ok(RoundLimit::Infinite),
        other => other
            .parse::<u32>()
            .map(RoundLimit::Fixed)
            .map_err(|_| format!("expected a number of rounds or 'inf', got '{value}'")),
    }
}

/// Cue overrides shared by program and timer commands.
#[derive(Args, Debug, Default)]
pub struct CueArgs {
    /// Play tones at phase changes
    #[arg(long)]
    pub sound: Option<bool>,
    /// Vibrate at phase changes (ignored by the terminal host)
    #[arg(long)]
    pub vibration: Option<bool>,
    /// Start with a 3 second countdown and tick the last 3 seconds
    #[arg(long)]
    pub countdown: Option<bool>,
    /// Keep the display awake while running
    #[arg(long)]
    pub keep_awake: Option<bool>,
}

impl CueArgs {
    pub fn apply(&self, cues: &mut CueSettings) {
        if let Some(v) = self.sound {
            cues.sound_enabled = v;
        }
        if let Some(v) = self.vibration {
            cues.vibration_enabled = v;
        }
        if let Some(v) = self.countdown {
            cues.countdown_enabled = v;
        }
        if let Some(v) = self.keep_awake {
            cues.keep_awake_enabled = v;
        }
    }
}
