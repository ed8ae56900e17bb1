//! Hysteresis on the emitted guide decision.

use std::fmt::Debug;
use tracing::trace;

/// The emitted value changes only after `required` consecutive identical raw
/// decisions, or once raw decisions have disagreed with it for
/// `unstick_after_secs` without a break.
#[derive(Debug, Clone)]
pub struct GuideHysteresis<T> {
    required: u32,
    unstick_after_secs: f64,
    emitted: Option<T>,
    /// When raw first diverged from the emitted value.
    candidate_since: Option<f64>,
    candidate: Option<T>,
    count: u32,
}

impl<T: Clone + PartialEq + Debug> GuideHysteresis<T> {
    pub fn new(required: u32, unstick_after_secs: f64) -> Self {
        Self {
            required: required.max(1),
            unstick_after_secs,
            emitted: None,
            candidate_since: None,
            candidate: None,
            count: 0,
        }
    }

    /// Feed one raw decision at `now` (seconds); returns the emitted value.
    pub fn update(&mut self, raw: T, now: f64) -> T {
        let Some(emitted) = self.emitted.clone() else {
            return self.emit(raw);
        };

        if raw == emitted {
            self.candidate = None;
            self.candidate_since = None;
            self.count = 0;
            return emitted;
        }

        let since = *self.candidate_since.get_or_insert(now);

        if self.candidate.as_ref() == Some(&raw) {
            self.count += 1;
        } else {
            self.candidate = Some(raw.clone());
            self.count = 1;
        }

        let stuck = now - since >= self.unstick_after_secs;
        if self.count >= self.required || stuck {
            trace!(?raw, stuck, "Guide decision changed");
            return self.emit(raw);
        }
        emitted
    }

    pub fn current(&self) -> Option<&T> {
        self.emitted.as_ref()
    }

    pub fn reset(&mut self) {
        self.emitted = None;
        self.candidate = None;
        self.count = 0;
        self.candidate_since = None;
    }

    fn emit(&mut self, value: T) -> T {
        self.emitted = Some(value.clone());
        self.candidate_since = None;
        self.candidate = None;
        self.count = 0;
        value
    }
}
