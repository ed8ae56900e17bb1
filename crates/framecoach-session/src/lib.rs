//! Async coaching sessions and offline replay for the FrameCoach engine.
//!
//! This crate provides:
//! - `CoachingSession`: a tokio task per session with latest-frame-wins input
//! - Environment-driven session configuration
//! - Structured session logging and Prometheus metrics
//! - JSON-lines replay of recorded sessions

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod replay;
pub mod runner;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use logging::{init_tracing, SessionLogger};
pub use replay::{parse_events, replay_file, ReplayEvent, ReplaySummary, Replayer};
pub use runner::{CoachingSession, PublishedResult, SessionHandle};
