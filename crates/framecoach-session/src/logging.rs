//! Tracing setup and structured session logging.

use framecoach_models::{EvaluationResult, GuideStage};
use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Install the global subscriber: JSON when `LOG_FORMAT=json`, colored text otherwise.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("framecoach=info,info"));

    let installed = if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Logger carrying the session id on every event.
///
/// Stage transitions are only logged when the displayed stage changes, so a
/// 30 fps stream does not flood the log.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: Uuid,
    last_stage: Option<GuideStage>,
}

impl SessionLogger {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            last_stage: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn log_start(&self, device_model: &str) {
        info!(session_id = %self.session_id, device_model, "Session started");
    }

    pub fn log_reference(&mut self, message: &str) {
        self.last_stage = None;
        info!(session_id = %self.session_id, "Reference: {}", message);
    }

    /// Log the guide stage when it differs from the last one seen.
    pub fn log_result(&mut self, result: &EvaluationResult) {
        let stage = result.guide.stage;
        if self.last_stage != Some(stage) {
            info!(
                session_id = %self.session_id,
                stage = stage.as_str(),
                guide = result.guide.guide_type.as_str(),
                message = %result.guide.message,
                "Guide stage changed"
            );
            self.last_stage = Some(stage);
        }
        if result.stability.just_locked {
            info!(
                session_id = %self.session_id,
                timestamp = result.timestamp,
                "Capture ready"
            );
        }
    }

    pub fn log_warning(&self, message: &str) {
        warn!(session_id = %self.session_id, "Session warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(session_id = %self.session_id, "Session error: {}", message);
    }

    pub fn log_shutdown(&self, frames: u64) {
        info!(session_id = %self.session_id, frames, "Session stopped");
    }

    /// Span to run the session task under.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("session", session_id = %self.session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecoach_models::{
        GateEvaluation, GateId, GateResult, SimpleGuideResult, StabilitySnapshot,
    };

    fn result(stage: GuideStage) -> EvaluationResult {
        EvaluationResult {
            timestamp: 0.0,
            guide: SimpleGuideResult {
                stage,
                ..SimpleGuideResult::idle()
            },
            gate_evaluation: GateEvaluation::assemble(
                GateId::ALL
                    .iter()
                    .map(|&g| GateResult::new(g, 1.0, 0.5, "ok"))
                    .collect::<Vec<_>>(),
            ),
            is_perfect: false,
            stability: StabilitySnapshot::default(),
            difficulty_multiplier: 1.0,
        }
    }

    #[test]
    fn test_logger_tracks_stage() {
        let id = Uuid::new_v4();
        let mut logger = SessionLogger::new(id);
        assert_eq!(logger.session_id(), id);

        logger.log_result(&result(GuideStage::Position));
        assert_eq!(logger.last_stage, Some(GuideStage::Position));

        logger.log_reference("cleared");
        assert_eq!(logger.last_stage, None);
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }
}
