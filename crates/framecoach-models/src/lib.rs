//! Shared data models for the FrameCoach composition engine.
//!
//! This crate provides Serde-serializable types for:
//! - Pose keypoints and normalized geometry
//! - Shot types and camera aspect ratios
//! - Gate results and the five-slot gate evaluation
//! - Reference baselines and live per-frame metrics
//! - Guide directives and the published evaluation result

pub mod aspect_ratio;
pub mod directive;
pub mod gate;
pub mod guide;
pub mod keypoint;
pub mod live;
pub mod rect;
pub mod reference;
pub mod shot_type;

// Re-export common types
pub use aspect_ratio::{AspectRatioParseError, CameraAspectRatio};
pub use directive::{BodyPart, LensAction, MoveDirection, StepSize, TiltDirection, ZoomDirection};
pub use gate::{
    FramingDirective, GateCategory, GateEvaluation, GateId, GateMetadata, GateResult,
    HorizontalDirective, PoseViolation, PositionMode, TiltDirective,
};
pub use guide::{
    EvaluationResult, GuideStage, GuideType, SimpleGuideResult, StabilitySnapshot,
    StabilityState,
};
pub use keypoint::{Keypoint, Keypoints, Point, DEFAULT_CONFIDENCE_THRESHOLD};
pub use live::{
    BodyType, BodyTypeParseError, GateSettings, LiveMetrics, PartDifference, PoseComparison,
};
pub use rect::{ImageSize, NormalizedRect};
pub use reference::{ReferenceAnalysis, ReferenceData, ReferenceFocalLength, ReferenceState};
pub use shot_type::{ShotType, ShotTypeParseError};
