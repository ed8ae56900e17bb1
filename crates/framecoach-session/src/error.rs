//! Session error types.

use framecoach_engine::EngineError;
use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid replay event on line {line}: {reason}")]
    InvalidEvent { line: usize, reason: String },

    #[error("Session {0} is closed")]
    Closed(String),

    #[error("Session task failed: {0}")]
    TaskFailed(String),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_event(line: usize, reason: impl Into<String>) -> Self {
        Self::InvalidEvent {
            line,
            reason: reason.into(),
        }
    }

    pub fn closed(session_id: impl ToString) -> Self {
        Self::Closed(session_id.to_string())
    }
}
