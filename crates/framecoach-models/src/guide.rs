//! Guide directives and the published evaluation result.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gate::GateEvaluation;

/// Sequential coaching stage; the guide addresses one thing at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GuideStage {
    /// No reference set.
    Idle,
    AspectRatio,
    FrameEntry,
    ShotType,
    Position,
    DistanceZoom,
    Pose,
    Perfect,
}

impl GuideStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuideStage::Idle => "idle",
            GuideStage::AspectRatio => "aspect_ratio",
            GuideStage::FrameEntry => "frame_entry",
            GuideStage::ShotType => "shot_type",
            GuideStage::Position => "position",
            GuideStage::DistanceZoom => "distance_zoom",
            GuideStage::Pose => "pose",
            GuideStage::Perfect => "perfect",
        }
    }
}

impl fmt::Display for GuideStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single action the user is asked to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GuideType {
    Waiting,
    ChangeAspectRatio,
    EnterFrame,
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    TiltUp,
    TiltDown,
    ZoomIn,
    ZoomOut,
    AdjustPose,
    Perfect,
}

impl GuideType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuideType::Waiting => "waiting",
            GuideType::ChangeAspectRatio => "change_aspect_ratio",
            GuideType::EnterFrame => "enter_frame",
            GuideType::MoveForward => "move_forward",
            GuideType::MoveBackward => "move_backward",
            GuideType::MoveLeft => "move_left",
            GuideType::MoveRight => "move_right",
            GuideType::TiltUp => "tilt_up",
            GuideType::TiltDown => "tilt_down",
            GuideType::ZoomIn => "zoom_in",
            GuideType::ZoomOut => "zoom_out",
            GuideType::AdjustPose => "adjust_pose",
            GuideType::Perfect => "perfect",
        }
    }
}

impl fmt::Display for GuideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stabilized guide output shown as the primary directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SimpleGuideResult {
    pub stage: GuideStage,
    pub guide_type: GuideType,
    pub message: String,
    /// Smoothed progress of the current stage (0-1).
    pub progress: f64,
    /// Eased progress for display (0-1).
    pub displayed_progress: f64,
    pub is_resolved: bool,
}

impl SimpleGuideResult {
    /// Neutral idle guide (no reference).
    pub fn idle() -> Self {
        Self {
            stage: GuideStage::Idle,
            guide_type: GuideType::Waiting,
            message: "Set a reference photo".to_string(),
            progress: 0.0,
            displayed_progress: 0.0,
            is_resolved: false,
        }
    }
}

/// Temporal lock state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StabilityState {
    #[default]
    Idle,
    Arming {
        /// Wall-clock seconds when the perfect streak started.
        started_at: f64,
    },
    Locked,
}

impl StabilityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StabilityState::Idle => "idle",
            StabilityState::Arming { .. } => "arming",
            StabilityState::Locked => "locked",
        }
    }
}

/// Temporal lock output for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct StabilitySnapshot {
    pub state: StabilityState,
    /// Hold-still progress (0-1); 1.0 signals capture readiness.
    pub progress: f64,
    /// True only on the frame the lock engaged.
    pub just_locked: bool,
}

/// Final per-frame output consumed by UI and capture collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvaluationResult {
    pub timestamp: f64,
    pub guide: SimpleGuideResult,
    pub gate_evaluation: GateEvaluation,
    /// Ready to capture: all gates passed for the full lock duration.
    pub is_perfect: bool,
    pub stability: StabilitySnapshot,
    pub difficulty_multiplier: f64,
}

impl EvaluationResult {
    pub fn stability_progress(&self) -> f64 {
        self.stability.progress
    }
}
