//! Session-level metrics and the Prometheus recorder.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{SessionError, SessionResult};

/// Install the Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> SessionResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| SessionError::Metrics(e.to_string()))
}

/// Metric names as constants for consistency.
pub mod names {
    pub const SESSIONS_ACTIVE: &str = "framecoach_sessions_active";
    pub const SESSION_COMMANDS_TOTAL: &str = "framecoach_session_commands_total";
    pub const FRAMES_SUPERSEDED_TOTAL: &str = "framecoach_frames_superseded_total";
    pub const RESULTS_PUBLISHED_TOTAL: &str = "framecoach_results_published_total";
    pub const REPLAY_EVENTS_TOTAL: &str = "framecoach_replay_events_total";
}

pub fn record_session_started() {
    gauge!(names::SESSIONS_ACTIVE).increment(1.0);
}

pub fn record_session_stopped() {
    gauge!(names::SESSIONS_ACTIVE).decrement(1.0);
}

pub fn record_command(command: &str) {
    let labels = [("command", command.to_string())];
    counter!(names::SESSION_COMMANDS_TOTAL, &labels).increment(1);
}

/// Frames overwritten in the single-slot channel before evaluation.
pub fn record_frames_superseded(count: u64) {
    if count > 0 {
        counter!(names::FRAMES_SUPERSEDED_TOTAL).increment(count);
    }
}

pub fn record_result_published(is_perfect: bool) {
    let labels = [("perfect", is_perfect.to_string())];
    counter!(names::RESULTS_PUBLISHED_TOTAL, &labels).increment(1);
}

pub fn record_replay_event(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::REPLAY_EVENTS_TOTAL, &labels).increment(1);
}
