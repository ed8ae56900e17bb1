//! Gate evaluation and stabilization core for composition coaching.
//!
//! This crate provides:
//! - Numeric estimators (body structure, shot type, pinhole distance, focal length)
//! - Five priority-ordered gates and the orchestrator that runs them
//! - Stabilizers (shot-type and guide hysteresis, debouncer, temporal lock,
//!   adaptive difficulty, active feedback smoothing)
//! - The sequential simple guide and the unified evaluator façade

pub mod config;
pub mod error;
pub mod estimators;
pub mod evaluator;
pub mod gates;
pub mod guide;
pub mod metrics;
pub mod orchestrator;
pub mod reference;
pub mod stabilizers;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use estimators::{
    classify_shot_type, estimate_distance_m, shoulder_pixel_width, BodyStructure, BodyTier,
    FocalLengthResolver, LensAnchor, LensTable, ShoulderSmoother, REFERENCE_SENSOR_WIDTH_MM,
};
pub use evaluator::UnifiedEvaluator;
pub use gates::{
    AspectRatioGate, FramingGate, Gate, GateContext, LensDistanceGate, LensDistanceState,
    PoseGate, PositionGate,
};
pub use guide::{select_guide, PERFECT_MESSAGE};
pub use orchestrator::{FrameAnalysis, GateOrchestrator};
pub use reference::build_reference;
pub use stabilizers::{
    ActiveFeedback, AdaptiveDifficulty, DebounceInput, DebounceOutcome, GuidanceDebouncer,
    GuideHysteresis, ShotTypeHysteresis, TemporalLock,
};
