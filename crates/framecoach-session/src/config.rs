//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

use framecoach_engine::{EngineConfig, UnifiedEvaluator};
use framecoach_models::BodyType;
use tracing::warn;

use crate::error::{SessionError, SessionResult};

/// Session configuration.
///
/// Everything is optional: unset values leave the engine defaults alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
    /// Device model used to pick the lens table
    pub device_model: Option<String>,
    /// Subject body type for distance estimation
    pub body_type: BodyType,
    /// Hold-still duration before capture readiness
    pub lock_duration: Option<Duration>,
    /// JSON file with a full engine configuration
    pub engine_config_path: Option<PathBuf>,
}

impl SessionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let body_type = match lookup("FRAMECOACH_BODY_TYPE") {
            Some(raw) => raw.parse::<BodyType>().unwrap_or_else(|e| {
                warn!(value = %raw, error = %e, "Ignoring FRAMECOACH_BODY_TYPE");
                BodyType::default()
            }),
            None => BodyType::default(),
        };

        Self {
            device_model: lookup("FRAMECOACH_DEVICE_MODEL").filter(|s| !s.trim().is_empty()),
            body_type,
            lock_duration: lookup("FRAMECOACH_LOCK_DURATION_MS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis),
            engine_config_path: lookup("FRAMECOACH_ENGINE_CONFIG")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn with_device_model(mut self, model: impl Into<String>) -> Self {
        self.device_model = Some(model.into());
        self
    }

    pub fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = body_type;
        self
    }

    pub fn with_lock_duration(mut self, duration: Duration) -> Self {
        self.lock_duration = Some(duration);
        self
    }

    /// Resolve the engine configuration: file (or defaults) plus overrides.
    pub fn engine_config(&self) -> SessionResult<EngineConfig> {
        let mut config = match &self.engine_config_path {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };
        if let Some(model) = &self.device_model {
            config = config.with_device_model(model.clone());
        }
        if let Some(lock) = self.lock_duration {
            config = config.with_lock_duration(lock.as_secs_f64());
        }
        config
            .validate()
            .map_err(|e| SessionError::config_error(e.to_string()))?;
        Ok(config)
    }

    /// Build an evaluator configured for this session.
    pub fn evaluator(&self) -> SessionResult<UnifiedEvaluator> {
        let mut evaluator = UnifiedEvaluator::new(self.engine_config()?)?;
        evaluator.set_body_type(self.body_type);
        Ok(evaluator)
    }
}
