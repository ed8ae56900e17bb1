//! Hold-still confirmation before signaling capture readiness.

use framecoach_models::{StabilitySnapshot, StabilityState};
use tracing::{debug, info};

use crate::metrics;

/// `Idle -> Arming -> Locked` state machine.
///
/// Any non-perfect frame returns to `Idle` immediately; there is no grace
/// period on the reset path.
#[derive(Debug, Clone)]
pub struct TemporalLock {
    duration_secs: f64,
    state: StabilityState,
    progress: f64,
}

impl Default for TemporalLock {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl TemporalLock {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            state: StabilityState::Idle,
            progress: 0.0,
        }
    }

    /// Advance with this frame's verdict at `now` (seconds).
    pub fn update(&mut self, perfect: bool, now: f64) -> StabilitySnapshot {
        if !perfect {
            if self.state != StabilityState::Idle {
                debug!(from = self.state.as_str(), "Temporal lock reset");
                metrics::record_lock_event(&StabilityState::Idle);
            }
            self.state = StabilityState::Idle;
            self.progress = 0.0;
            return self.snapshot(false);
        }

        match self.state {
            StabilityState::Locked => self.snapshot(false),
            StabilityState::Idle => {
                self.state = StabilityState::Arming { started_at: now };
                metrics::record_lock_event(&self.state);
                self.advance(now, now)
            }
            StabilityState::Arming { started_at } => self.advance(started_at, now),
        }
    }

    pub fn state(&self) -> StabilityState {
        self.state
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_locked(&self) -> bool {
        self.state == StabilityState::Locked
    }

    /// External reset, e.g. after a capture.
    pub fn reset(&mut self) {
        self.state = StabilityState::Idle;
        self.progress = 0.0;
    }

    fn advance(&mut self, started_at: f64, now: f64) -> StabilitySnapshot {
        let elapsed = (now - started_at).max(0.0);
        if self.duration_secs <= 0.0 || elapsed >= self.duration_secs {
            self.state = StabilityState::Locked;
            self.progress = 1.0;
            info!(elapsed, "Temporal lock engaged");
            metrics::record_lock_event(&self.state);
            return self.snapshot(true);
        }
        self.progress = (elapsed / self.duration_secs).clamp(0.0, 1.0);
        self.snapshot(false)
    }

    fn snapshot(&self, just_locked: bool) -> StabilitySnapshot {
        StabilitySnapshot {
            state: self.state,
            progress: self.progress,
            just_locked,
        }
    }
}
