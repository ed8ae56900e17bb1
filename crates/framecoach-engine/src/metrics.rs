//! Metrics emitted by the engine.
//!
//! Only the `metrics` facade is used here; installing a recorder (Prometheus
//! or otherwise) is left to the binary hosting the engine.

use framecoach_models::{GateEvaluation, GateResult, StabilityState};
use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    // Gate metrics
    pub const GATE_EVALUATIONS_TOTAL: &str = "framecoach_gate_evaluations_total";
    pub const GATE_ERRORS_TOTAL: &str = "framecoach_gate_errors_total";
    pub const GATE_SCORE: &str = "framecoach_gate_score";

    // Frame metrics
    pub const FRAMES_EVALUATED_TOTAL: &str = "framecoach_frames_evaluated_total";
    pub const FRAME_EVALUATION_DURATION_SECONDS: &str =
        "framecoach_frame_evaluation_duration_seconds";
    pub const NO_SUBJECT_FRAMES_TOTAL: &str = "framecoach_no_subject_frames_total";

    // Stabilizer metrics
    pub const LOCK_EVENTS_TOTAL: &str = "framecoach_lock_events_total";
    pub const DIFFICULTY_MULTIPLIER: &str = "framecoach_difficulty_multiplier";
    pub const DIFFICULTY_BUMPS_TOTAL: &str = "framecoach_difficulty_bumps_total";

    // Reference metrics
    pub const REFERENCE_CHANGES_TOTAL: &str = "framecoach_reference_changes_total";
}

/// Record one gate result.
pub fn record_gate_result(result: &GateResult) {
    let labels = [
        ("gate", result.gate.as_str().to_string()),
        ("passed", result.passed.to_string()),
    ];
    counter!(names::GATE_EVALUATIONS_TOTAL, &labels).increment(1);

    let gate_label = [("gate", result.gate.as_str().to_string())];
    histogram!(names::GATE_SCORE, &gate_label).record(result.score);
}

/// Record a gate that returned an error.
pub fn record_gate_error(gate: &str) {
    let labels = [("gate", gate.to_string())];
    counter!(names::GATE_ERRORS_TOTAL, &labels).increment(1);
}

/// Record a fully evaluated frame.
pub fn record_frame(evaluation: &GateEvaluation, duration_secs: f64) {
    let labels = [("all_passed", evaluation.all_passed().to_string())];
    counter!(names::FRAMES_EVALUATED_TOTAL, &labels).increment(1);
    histogram!(names::FRAME_EVALUATION_DURATION_SECONDS).record(duration_secs);
}

/// Record a frame without a recognizable subject.
pub fn record_no_subject() {
    counter!(names::NO_SUBJECT_FRAMES_TOTAL).increment(1);
}

/// Record a temporal lock transition.
pub fn record_lock_event(state: &StabilityState) {
    let labels = [("state", state.as_str().to_string())];
    counter!(names::LOCK_EVENTS_TOTAL, &labels).increment(1);
}

/// Update the difficulty multiplier gauge.
pub fn set_difficulty_multiplier(multiplier: f64) {
    gauge!(names::DIFFICULTY_MULTIPLIER).set(multiplier);
}

/// Record a difficulty bump.
pub fn record_difficulty_bump() {
    counter!(names::DIFFICULTY_BUMPS_TOTAL).increment(1);
}

/// Record a reference set/clear.
pub fn record_reference_change(action: &str) {
    let labels = [("action", action.to_string())];
    counter!(names::REFERENCE_CHANGES_TOTAL, &labels).increment(1);
}
