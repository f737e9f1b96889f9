//! Audio and vibration cues.
//!
//! The dispatcher maps timer events to tone and vibration patterns and
//! hands them to a [`CueSink`]. Sound and vibration are gated separately.
//! Hosts without audio or vibration use [`NullCueSink`].

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::program::CueSettings;
use crate::timer::Phase;

/// Output port for cues. Both calls are fire-and-forget.
pub trait CueSink {
    fn play_tone(&mut self, frequency_hz: f32, duration_sec: f32);
    fn vibrate(&mut self, pattern_ms: &[u32]);
}

/// Sink for hosts with neither audio nor vibration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCueSink;

impl CueSink for NullCueSink {
    fn play_tone(&mut self, _frequency_hz: f32, _duration_sec: f32) {}
    fn vibrate(&mut self, _pattern_ms: &[u32]) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    WorkStart,
    RestStart,
    /// Warm-up, cool-down and countdown entry.
    Neutral,
    CountdownTick,
}

impl Cue {
    /// Cue fired when entering `phase`.
    pub fn for_phase(phase: Phase) -> Cue {
        match phase {
            Phase::Work => Cue::WorkStart,
            Phase::Rest => Cue::RestStart,
            _ => Cue::Neutral,
        }
    }

    /// Tones as `(frequency_hz, duration_sec)`, played in order.
    pub fn tones(&self) -> &'static [(f32, f32)] {
        match self {
            Cue::WorkStart => &[(880.0, 0.12), (880.0, 0.12)],
            Cue::RestStart => &[(440.0, 0.35)],
            Cue::Neutral => &[(660.0, 0.2)],
            Cue::CountdownTick => &[(1000.0, 0.06)],
        }
    }

    /// Vibration pattern in milliseconds, alternating on and off.
    pub fn vibration(&self) -> &'static [u32] {
        match self {
            Cue::WorkStart => &[120, 60, 120],
            Cue::RestStart => &[300],
            Cue::Neutral => &[150],
            Cue::CountdownTick => &[40],
        }
    }
}

pub struct CueDispatcher {
    sink: Box<dyn CueSink>,
}

impl CueDispatcher {
    pub fn new(sink: Box<dyn CueSink>) -> Self {
        Self { sink }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(NullCueSink))
    }

    pub fn dispatch(&mut self, cue: Cue, settings: &CueSettings) {
        if settings.sound_enabled {
            for &(frequency, duration) in cue.tones() {
                self.sink.play_tone(frequency, duration);
            }
        }
        if settings.vibration_enabled {
            self.sink.vibrate(cue.vibration());
        }
        tracing::trace!(?cue, "cue dispatched");
    }
}

impl std::fmt::Debug for CueDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueDispatcher").finish_non_exhaustive()
    }
}

/// One call received by a [`RecordingCueSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum CueCall {
    Tone { frequency_hz: f32, duration_sec: f32 },
    Vibrate(Vec<u32>),
}

/// Sink that records every call. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingCueSink {
    calls: Arc<Mutex<Vec<CueCall>>>,
}

impl RecordingCueSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<CueCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn tone_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, CueCall::Tone { .. }))
            .count()
    }

    pub fn vibration_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, CueCall::Vibrate(_)))
            .count()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn push(&self, call: CueCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl CueSink for RecordingCueSink {
    fn play_tone(&mut self, frequency_hz: f32, duration_sec: f32) {
        self.push(CueCall::Tone {
            frequency_hz,
            duration_sec,
        });
    }

    fn vibrate(&mut self, pattern_ms: &[u32]) {
        self.push(CueCall::Vibrate(pattern_ms.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> (CueDispatcher, RecordingCueSink) {
        let sink = RecordingCueSink::new();
        (CueDispatcher::new(Box::new(sink.clone())), sink)
    }

    #[test]
    fn work_start_is_two_tones_and_double_pulse() {
        let (mut cues, sink) = dispatcher();
        cues.dispatch(Cue::WorkStart, &CueSettings::default());
        assert_eq!(sink.tone_count(), 2);
        assert_eq!(
            sink.calls().last(),
            Some(&CueCall::Vibrate(vec![120, 60, 120]))
        );
    }

    #[test]
    fn sound_and_vibration_are_gated_independently() {
        let (mut cues, sink) = dispatcher();
        let settings = CueSettings {
            sound_enabled: false,
            ..CueSettings::default()
        };
        cues.dispatch(Cue::RestStart, &settings);
        assert_eq!(sink.tone_count(), 0);
        assert_eq!(sink.vibration_count(), 1);

        sink.clear();
        let settings = CueSettings {
            vibration_enabled: false,
            ..CueSettings::default()
        };
        cues.dispatch(Cue::RestStart, &settings);
        assert_eq!(sink.tone_count(), 1);
        assert_eq!(sink.vibration_count(), 0);
    }

    #[test]
    fn phase_entry_mapping() {
        assert_eq!(Cue::for_phase(Phase::Work), Cue::WorkStart);
        assert_eq!(Cue::for_phase(Phase::Rest), Cue::RestStart);
        assert_eq!(Cue::for_phase(Phase::Warmup), Cue::Neutral);
        assert_eq!(Cue::for_phase(Phase::Cooldown), Cue::Neutral);
    }

    #[test]
    fn null_sink_accepts_everything() {
        let mut cues = CueDispatcher::silent();
        cues.dispatch(Cue::CountdownTick, &CueSettings::default());
    }
}
