//! Error types for engine operations.
//!
//! Per-frame problems never surface as errors to callers: gates return
//! `Err` and the orchestrator converts it into a degraded `GateResult`.
//! Errors do surface from configuration loading and reference building.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid zoom factor: {0}")]
    InvalidZoom(f64),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Invalid lens table for {device}: {reason}")]
    InvalidLensTable { device: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl EngineError {
    /// Create a degenerate geometry error.
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create an invalid lens table error.
    pub fn invalid_lens_table(device: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLensTable {
            device: device.into(),
            reason: reason.into(),
        }
    }
}
