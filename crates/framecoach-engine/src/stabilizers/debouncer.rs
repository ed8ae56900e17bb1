//! Time and magnitude gated debouncing of feedback text.
//!
//! Used by the lens/distance gate, whose instantaneous message would
//! otherwise flicker with every small change in the distance estimate.

use tracing::trace;

use crate::config::EngineConfig;

/// One candidate feedback update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebounceInput<'a> {
    pub message: &'a str,
    pub category: &'a str,
    pub distance_m: Option<f64>,
    pub focal_mm: Option<f64>,
}

/// The feedback to show and whether it changed this call.
#[derive(Debug, Clone, PartialEq)]
pub struct DebounceOutcome {
    pub message: String,
    pub updated: bool,
}

#[derive(Debug, Clone)]
struct Emitted {
    message: String,
    category: String,
    distance_m: Option<f64>,
    focal_mm: Option<f64>,
    at: f64,
    repeats: u32,
}

#[derive(Debug, Clone)]
pub struct GuidanceDebouncer {
    min_interval_secs: f64,
    distance_change: f64,
    focal_change_mm: f64,
    refresh_repeats: u32,
    refresh_secs: f64,
    last: Option<Emitted>,
}

impl Default for GuidanceDebouncer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl GuidanceDebouncer {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            min_interval_secs: config.debounce_min_interval_secs,
            distance_change: config.debounce_distance_change,
            focal_change_mm: config.debounce_focal_change_mm,
            refresh_repeats: config.debounce_refresh_repeats,
            refresh_secs: config.debounce_refresh_secs,
            last: None,
        }
    }

    /// Decide whether `input` replaces the shown feedback at `now` (seconds).
    ///
    /// Within the minimum interval only a category change or a significant
    /// numeric change goes through. After it, a changed message does too.
    /// An unchanged message repeated often enough over a long enough span is
    /// re-emitted once so the display never looks frozen.
    pub fn update(&mut self, input: DebounceInput<'_>, now: f64) -> DebounceOutcome {
        let Some(last) = self.last.as_mut() else {
            return self.emit(input, now);
        };

        let elapsed = now - last.at;
        let category_changed = last.category != input.category;
        let message_changed = last.message != input.message;
        let significant = significant_change(last.distance_m, input.distance_m, self.distance_change)
            || focal_changed(last.focal_mm, input.focal_mm, self.focal_change_mm);

        if category_changed || significant || (message_changed && elapsed >= self.min_interval_secs) {
            trace!(category_changed, significant, message_changed, elapsed, "Debouncer update");
            return self.emit(input, now);
        }

        if !message_changed {
            last.repeats += 1;
            if last.repeats >= self.refresh_repeats && elapsed >= self.refresh_secs {
                trace!(repeats = last.repeats, "Debouncer periodic refresh");
                return self.emit(input, now);
            }
        }

        DebounceOutcome {
            message: last.message.clone(),
            updated: false,
        }
    }

    /// Last emitted message.
    pub fn current(&self) -> Option<&str> {
        self.last.as_ref().map(|l| l.message.as_str())
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    fn emit(&mut self, input: DebounceInput<'_>, now: f64) -> DebounceOutcome {
        self.last = Some(Emitted {
            message: input.message.to_string(),
            category: input.category.to_string(),
            distance_m: input.distance_m,
            focal_mm: input.focal_mm,
            at: now,
            repeats: 0,
        });
        DebounceOutcome {
            message: input.message.to_string(),
            updated: true,
        }
    }
}

fn significant_change(previous: Option<f64>, current: Option<f64>, relative: f64) -> bool {
    match (previous, current) {
        (Some(p), Some(c)) if p.abs() > f64::EPSILON => ((c - p) / p).abs() > relative,
        (Some(_), Some(_)) => false,
        (None, None) => false,
        _ => true,
    }
}

fn focal_changed(previous: Option<f64>, current: Option<f64>, threshold_mm: f64) -> bool {
    match (previous, current) {
        (Some(p), Some(c)) => (c - p).abs() > threshold_mm,
        (None, None) => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(message: &'a str, distance: f64, focal: f64) -> DebounceInput<'a> {
        DebounceInput {
            message,
            category: "distance",
            distance_m: Some(distance),
            focal_mm: Some(focal),
        }
    }

    #[test]
    fn test_small_change_within_interval_suppressed() {
        let mut d = GuidanceDebouncer::default();
        let first = d.update(input("Move back 1.0m", 3.0, 26.0), 0.0);
        assert!(first.updated);

        let second = d.update(input("Move back 1.1m", 3.2, 28.0), 0.2);
        assert!(!second.updated);
        assert_eq!(second.message, "Move back 1.0m");

        let third = d.update(input("Move back 2.0m", 4.5, 28.0), 0.7);
        assert!(third.updated);
        assert_eq!(third.message, "Move back 2.0m");
    }

    #[test]
    fn test_significant_change_bypasses_interval() {
        let mut d = GuidanceDebouncer::default();
        d.update(input("Move back 1.0m", 3.0, 26.0), 0.0);

        let distance_jump = d.update(input("Move back 2.0m", 4.0, 26.0), 0.1);
        assert!(distance_jump.updated);

        let focal_jump = d.update(input("Zoom in to 2x", 4.0, 40.0), 0.15);
        assert!(focal_jump.updated);
    }

    #[test]
    fn test_category_change_bypasses_interval() {
        let mut d = GuidanceDebouncer::default();
        d.update(input("Move back 1.0m", 3.0, 26.0), 0.0);
        let matched = d.update(
            DebounceInput {
                message: "Distance and zoom match",
                category: "matched",
                distance_m: Some(3.0),
                focal_mm: Some(26.0),
            },
            0.1,
        );
        assert!(matched.updated);
    }

    #[test]
    fn test_message_change_after_interval() {
        let mut d = GuidanceDebouncer::default();
        d.update(input("Move back 1.0m", 3.0, 26.0), 0.0);
        assert!(d.update(input("Move back 1.1m", 3.1, 26.0), 0.6).updated);
    }

    #[test]
    fn test_periodic_refresh_of_repeated_message() {
        let mut d = GuidanceDebouncer::default();
        d.update(input("Move back 1.0m", 3.0, 26.0), 0.0);

        let mut refreshed_at = Vec::new();
        for i in 1..=30 {
            let t = i as f64 * 0.1;
            if d.update(input("Move back 1.0m", 3.0, 26.0), t).updated {
                refreshed_at.push(t);
            }
        }
        assert_eq!(refreshed_at.len(), 1, "refreshed at {:?}", refreshed_at);
        assert!(refreshed_at[0] >= 2.0);
    }
}
