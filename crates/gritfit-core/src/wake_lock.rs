//! Best-effort display wake lock.
//!
//! The tick loop tolerates late callbacks, so a missing or denied wake lock
//! only costs convenience. Every failure is logged and dropped here.

use std::sync::{Arc, Mutex};

use crate::error::WakeLockError;

/// Opaque handle returned by a host for a granted wake lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeLockHandle(pub u64);

/// Host facility that keeps the display on.
pub trait WakeLockHost {
    fn request_wake_lock(&mut self) -> Result<WakeLockHandle, WakeLockError>;
    fn release(&mut self, handle: WakeLockHandle);
}

/// Host without a wake lock facility.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWakeLock;

impl WakeLockHost for NoWakeLock {
    fn request_wake_lock(&mut self) -> Result<WakeLockHandle, WakeLockError> {
        Err(WakeLockError::Unsupported)
    }

    fn release(&mut self, _handle: WakeLockHandle) {}
}

pub struct WakeLockManager {
    host: Box<dyn WakeLockHost>,
    held: Option<WakeLockHandle>,
    /// Set once the host has reported the facility missing.
    unsupported: bool,
}

impl WakeLockManager {
    pub fn new(host: Box<dyn WakeLockHost>) -> Self {
        Self {
            host,
            held: None,
            unsupported: false,
        }
    }

    pub fn unsupported() -> Self {
        Self::new(Box::new(NoWakeLock))
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    pub fn is_unsupported(&self) -> bool {
        self.unsupported
    }

    /// Request the lock if `enabled` and not already held.
    pub fn acquire(&mut self, enabled: bool) {
        if !enabled || self.held.is_some() {
            return;
        }
        match self.host.request_wake_lock() {
            Ok(handle) => {
                tracing::debug!(handle = handle.0, "wake lock acquired");
                self.held = Some(handle);
            }
            Err(WakeLockError::Unsupported) => {
                self.unsupported = true;
                tracing::debug!("wake lock unsupported by host");
            }
            Err(e) => tracing::debug!(error = %e, "wake lock request failed"),
        }
    }

    pub fn release(&mut self) {
        if let Some(handle) = self.held.take() {
            self.host.release(handle);
            tracing::debug!(handle = handle.0, "wake lock released");
        }
    }

    /// Forget the handle without releasing it; hosts drop wake locks on
    /// their own when the surface is hidden.
    pub fn mark_lost(&mut self) {
        if self.held.take().is_some() {
            tracing::debug!("wake lock lost while hidden");
        }
    }
}

impl std::fmt::Debug for WakeLockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeLockManager")
            .field("held", &self.held)
            .field("unsupported", &self.unsupported)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct FakeState {
    next_handle: u64,
    active: Vec<WakeLockHandle>,
    requests: u64,
    deny_with: Option<WakeLockError>,
}

/// In-process host that grants locks and tracks which are active.
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeWakeLockHost {
    state: Arc<Mutex<FakeState>>,
}

impl FakeWakeLockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host that refuses every request with `error`.
    pub fn denying(error: WakeLockError) -> Self {
        let host = Self::default();
        if let Ok(mut state) = host.state.lock() {
            state.deny_with = Some(error);
        }
        host
    }

    pub fn active_count(&self) -> usize {
        self.state.lock().map(|s| s.active.len()).unwrap_or(0)
    }

    pub fn request_count(&self) -> u64 {
        self.state.lock().map(|s| s.requests).unwrap_or(0)
    }
}

impl WakeLockHost for FakeWakeLockHost {
    fn request_wake_lock(&mut self) -> Result<WakeLockHandle, WakeLockError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| WakeLockError::Denied("host state poisoned".into()))?;
        state.requests += 1;
        if let Some(err) = state.deny_with.clone() {
            return Err(err);
        }
        state.next_handle += 1;
        let handle = WakeLockHandle(state.next_handle);
        state.active.push(handle);
        Ok(handle)
    }

    fn release(&mut self, handle: WakeLockHandle) {
        if let Ok(mut state) = self.state.lock() {
            state.active.retain(|h| *h != handle);
        }
    }
}
