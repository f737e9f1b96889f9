//! Host ports for time and tick scheduling.
//!
//! The engine never sleeps and never spawns anything. It reads wall-clock
//! time from a [`Clock`] and asks a [`TickScheduler`] for the next callback
//! at the end of every tick. The host invokes `tick` when a callback is due.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

/// Wall-clock source in milliseconds since the Unix epoch.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Convert a clock reading to a UTC timestamp.
pub fn to_datetime(ms: u64) -> DateTime<Utc> {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default()
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Settable clock shared between a test and the engine it drives.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Cooperative scheduler port.
///
/// `schedule_next` is called once per tick while the run is live;
/// `cancel` drops any pending callback when the run finishes.
pub trait TickScheduler {
    fn schedule_next(&mut self);
    fn cancel(&mut self);
}

#[derive(Debug, Default)]
struct PollState {
    pending: bool,
    requested: u64,
    cancelled: u64,
}

/// Pending-flag scheduler polled by the host loop.
///
/// Clones share state: hand one clone to the engine and keep another in
/// the loop that calls [`PollScheduler::take_pending`].
#[derive(Debug, Clone, Default)]
pub struct PollScheduler {
    state: Arc<Mutex<PollState>>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the pending callback, if any.
    pub fn take_pending(&self) -> bool {
        let mut state = self.lock();
        std::mem::replace(&mut state.pending, false)
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }

    /// Total number of callbacks requested so far.
    pub fn requested(&self) -> u64 {
        self.lock().requested
    }

    /// Total number of cancellations so far.
    pub fn cancelled(&self) -> u64 {
        self.lock().cancelled
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PollState> {
        // A poisoned flag is still a valid flag.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TickScheduler for PollScheduler {
    fn schedule_next(&mut self) {
        let mut state = self.lock();
        state.pending = true;
        state.requested += 1;
    }

    fn cancel(&mut self) {
        let mut state = self.lock();
        state.pending = false;
        state.cancelled += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new(1_000);
        let other = clock.clone();
        clock.advance_secs(2);
        assert_eq!(other.now_ms(), 3_000);
        other.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn to_datetime_converts_epoch_millis() {
        let dt = to_datetime(1_700_000_000_123);
        assert_eq!(dt.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn poll_scheduler_pending_is_consumed_once() {
        let host = PollScheduler::new();
        let mut port = host.clone();
        port.schedule_next();
        assert!(host.take_pending());
        assert!(!host.take_pending());
        assert_eq!(host.requested(), 1);
    }

    #[test]
    fn cancel_clears_pending() {
        let host = PollScheduler::new();
        let mut port = host.clone();
        port.schedule_next();
        port.cancel();
        assert!(!host.is_pending());
        assert_eq!(host.cancelled(), 1);
    }
}
