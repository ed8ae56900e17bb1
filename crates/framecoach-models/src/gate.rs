//! Gate results and the per-frame gate evaluation.
//!
//! Each of the five gates produces one [`GateResult`] per frame. The results
//! are collected into a [`GateEvaluation`] with exactly one slot per gate.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::aspect_ratio::CameraAspectRatio;
use crate::directive::{BodyPart, LensAction, MoveDirection, StepSize, TiltDirection};
use crate::shot_type::ShotType;

/// Gate identity and evaluation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GateId {
    AspectRatio,
    Framing,
    Position,
    LensDistance,
    Pose,
}

impl GateId {
    /// Gates in evaluation (priority) order.
    pub const ALL: [GateId; 5] = [
        GateId::AspectRatio,
        GateId::Framing,
        GateId::Position,
        GateId::LensDistance,
        GateId::Pose,
    ];

    /// Order in which failing gates are surfaced to the user. Pose comes
    /// before lens/distance so the subject is settled before zoom advice.
    pub const FEEDBACK_PRIORITY: [GateId; 5] = [
        GateId::AspectRatio,
        GateId::Framing,
        GateId::Position,
        GateId::Pose,
        GateId::LensDistance,
    ];

    /// Evaluation priority (0..=4).
    pub fn priority(&self) -> u8 {
        match self {
            GateId::AspectRatio => 0,
            GateId::Framing => 1,
            GateId::Position => 2,
            GateId::LensDistance => 3,
            GateId::Pose => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GateId::AspectRatio => "aspect_ratio",
            GateId::Framing => "framing",
            GateId::Position => "position",
            GateId::LensDistance => "lens_distance",
            GateId::Pose => "pose",
        }
    }

    /// The regular category reported by this gate.
    pub fn category(&self) -> GateCategory {
        match self {
            GateId::AspectRatio => GateCategory::AspectRatio,
            GateId::Framing => GateCategory::Framing,
            GateId::Position => GateCategory::Position,
            GateId::LensDistance => GateCategory::LensDistance,
            GateId::Pose => GateCategory::Pose,
        }
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category of a gate result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GateCategory {
    AspectRatio,
    Framing,
    Position,
    LensDistance,
    Pose,
    /// No reference baseline is set.
    Idle,
    /// No subject could be recognized.
    NoSubject,
    /// Inputs were insufficient this frame; waiting for better data.
    Analyzing,
    /// The gate could not be evaluated.
    Error,
}

impl GateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateCategory::AspectRatio => "aspect_ratio",
            GateCategory::Framing => "framing",
            GateCategory::Position => "position",
            GateCategory::LensDistance => "lens_distance",
            GateCategory::Pose => "pose",
            GateCategory::Idle => "idle",
            GateCategory::NoSubject => "no_subject",
            GateCategory::Analyzing => "analyzing",
            GateCategory::Error => "error",
        }
    }
}

/// Forward/backward directive with a step size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FramingDirective {
    pub direction: MoveDirection,
    pub step: StepSize,
}

/// Left/right directive from the position gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HorizontalDirective {
    pub direction: MoveDirection,
    pub step: StepSize,
    /// Offset as a percentage of frame width.
    pub offset_percent: f64,
}

/// Tilt directive from the position gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TiltDirective {
    pub direction: TiltDirection,
    pub degrees: f64,
}

/// How the position gate measured alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PositionMode {
    /// Keypoint structure compared against the reference structure.
    Keypoints,
    /// Bounding box scored against rule-of-thirds gridlines.
    RuleOfThirds,
}

/// One body part outside the angle tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PoseViolation {
    pub part: BodyPart,
    pub angle_diff_deg: f64,
    pub message: String,
}

/// Typed per-gate payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum GateMetadata {
    AspectRatio {
        current: Option<CameraAspectRatio>,
        reference: Option<CameraAspectRatio>,
    },
    Framing {
        raw: Option<ShotType>,
        stable: Option<ShotType>,
        reference: Option<ShotType>,
        size_ratio: Option<f64>,
        cropped: bool,
        directive: Option<FramingDirective>,
    },
    Position {
        mode: PositionMode,
        horizontal: Option<HorizontalDirective>,
        vertical: Option<TiltDirective>,
    },
    LensDistance {
        current_focal_mm: f64,
        reference_focal_mm: f64,
        current_distance_m: Option<f64>,
        reference_distance_m: Option<f64>,
        action: LensAction,
        estimated_reference: bool,
    },
    Pose {
        violations: Vec<PoseViolation>,
    },
}

impl GateMetadata {
    /// Stable shot type carried by framing metadata.
    pub fn detected_shot_type(&self) -> Option<ShotType> {
        match self {
            GateMetadata::Framing { stable, .. } => *stable,
            _ => None,
        }
    }
}

/// Result of one gate for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GateResult {
    pub gate: GateId,
    /// Score in [0, 1]
    pub score: f64,
    /// Pass threshold in [0, 1]
    pub threshold: f64,
    /// Always `score >= threshold`
    pub passed: bool,
    pub feedback: String,
    pub category: GateCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GateMetadata>,
}

impl GateResult {
    /// Create a result; score and threshold are clamped into [0, 1].
    pub fn new(gate: GateId, score: f64, threshold: f64, feedback: impl Into<String>) -> Self {
        let score = clamp_unit(score);
        let threshold = clamp_unit(threshold);
        Self {
            gate,
            score,
            threshold,
            passed: score >= threshold,
            feedback: feedback.into(),
            category: gate.category(),
            debug_info: None,
            metadata: None,
        }
    }

    /// No reference baseline is set.
    pub fn reference_missing(gate: GateId, threshold: f64) -> Self {
        Self::new(gate, 0.0, threshold, "Set a reference photo").with_category(GateCategory::Idle)
    }

    /// No subject recognized.
    pub fn no_subject(gate: GateId, threshold: f64, feedback: impl Into<String>) -> Self {
        Self::new(gate, 0.0, threshold, feedback).with_category(GateCategory::NoSubject)
    }

    /// Waiting for usable inputs.
    pub fn analyzing(gate: GateId, threshold: f64, feedback: impl Into<String>) -> Self {
        Self::new(gate, 0.0, threshold, feedback).with_category(GateCategory::Analyzing)
    }

    /// Fallback for a gate that failed or did not run.
    pub fn error(gate: GateId, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(gate, 0.0, 1.0, "Analyzing…")
            .with_category(GateCategory::Error)
            .with_debug(message)
    }

    pub fn with_category(mut self, category: GateCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_debug(mut self, debug: impl Into<String>) -> Self {
        self.debug_info = Some(debug.into());
        self
    }

    pub fn with_metadata(mut self, metadata: GateMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// All five gate results for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GateEvaluation {
    pub aspect_ratio: GateResult,
    pub framing: GateResult,
    pub position: GateResult,
    pub lens_distance: GateResult,
    pub pose: GateResult,
    pub current_shot_type: Option<ShotType>,
    pub reference_shot_type: Option<ShotType>,
}

impl GateEvaluation {
    /// Build from results in any order. Missing gates get an error fallback;
    /// for duplicates the last result wins.
    pub fn assemble(results: impl IntoIterator<Item = GateResult>) -> Self {
        let mut slots: [Option<GateResult>; 5] = Default::default();
        for result in results {
            let idx = result.gate.priority() as usize;
            slots[idx] = Some(result);
        }
        let [aspect_ratio, framing, position, lens_distance, pose] = slots;
        let fill = |slot: Option<GateResult>, gate: GateId| {
            slot.unwrap_or_else(|| GateResult::error(gate, "gate did not run"))
        };
        Self {
            aspect_ratio: fill(aspect_ratio, GateId::AspectRatio),
            framing: fill(framing, GateId::Framing),
            position: fill(position, GateId::Position),
            lens_distance: fill(lens_distance, GateId::LensDistance),
            pose: fill(pose, GateId::Pose),
            current_shot_type: None,
            reference_shot_type: None,
        }
    }

    pub fn with_shot_types(mut self, current: Option<ShotType>, reference: Option<ShotType>) -> Self {
        self.current_shot_type = current;
        self.reference_shot_type = reference;
        self
    }

    pub fn get(&self, gate: GateId) -> &GateResult {
        match gate {
            GateId::AspectRatio => &self.aspect_ratio,
            GateId::Framing => &self.framing,
            GateId::Position => &self.position,
            GateId::LensDistance => &self.lens_distance,
            GateId::Pose => &self.pose,
        }
    }

    /// Results in evaluation priority order.
    pub fn iter(&self) -> impl Iterator<Item = &GateResult> {
        GateId::ALL.into_iter().map(move |gate| self.get(gate))
    }

    pub fn all_passed(&self) -> bool {
        self.iter().all(|r| r.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.iter().filter(|r| r.passed).count()
    }

    /// Mean of the five scores.
    pub fn overall_score(&self) -> f64 {
        self.iter().map(|r| r.score).sum::<f64>() / GateId::ALL.len() as f64
    }

    /// First failing gate in feedback priority order.
    pub fn current_failed_gate(&self) -> Option<GateId> {
        GateId::FEEDBACK_PRIORITY
            .into_iter()
            .find(|&gate| !self.get(gate).passed)
    }

    /// Feedback of the first failing gate.
    pub fn primary_feedback(&self) -> Option<&str> {
        self.current_failed_gate()
            .map(|gate| self.get(gate).feedback.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing(gate: GateId) -> GateResult {
        GateResult::new(gate, 1.0, 0.8, "ok")
    }

    #[test]
    fn test_passed_is_score_ge_threshold() {
        assert!(GateResult::new(GateId::Position, 0.8, 0.8, "").passed);
        assert!(!GateResult::new(GateId::Position, 0.79, 0.8, "").passed);
    }

    #[test]
    fn test_scores_are_clamped() {
        let r = GateResult::new(GateId::Pose, 1.7, -0.2, "");
        assert_eq!(r.score, 1.0);
        assert_eq!(r.threshold, 0.0);
        let nan = GateResult::new(GateId::Pose, f64::NAN, 0.5, "");
        assert_eq!(nan.score, 0.0);
    }

    #[test]
    fn test_assemble_fills_missing_slots() {
        let eval = GateEvaluation::assemble(vec![passing(GateId::Framing)]);
        assert!(eval.framing.passed);
        assert_eq!(eval.pose.category, GateCategory::Error);
        assert_eq!(eval.aspect_ratio.score, 0.0);
        assert_eq!(eval.passed_count(), 1);
    }

    #[test]
    fn test_primary_feedback_uses_feedback_priority() {
        let mut results: Vec<GateResult> = GateId::ALL.iter().map(|&g| passing(g)).collect();
        results[GateId::LensDistance.priority() as usize] =
            GateResult::new(GateId::LensDistance, 0.2, 0.8, "zoom in");
        results[GateId::Pose.priority() as usize] =
            GateResult::new(GateId::Pose, 0.2, 0.8, "raise your arm");
        let eval = GateEvaluation::assemble(results);

        assert_eq!(eval.current_failed_gate(), Some(GateId::Pose));
        assert_eq!(eval.primary_feedback(), Some("raise your arm"));
    }

    #[test]
    fn test_overall_score_is_mean() {
        let mut results: Vec<GateResult> = GateId::ALL.iter().map(|&g| passing(g)).collect();
        results[0] = GateResult::new(GateId::AspectRatio, 0.0, 1.0, "ratio");
        let eval = GateEvaluation::assemble(results);
        assert!((eval.overall_score() - 0.8).abs() < 1e-9);
        assert!(!eval.all_passed());
        assert_eq!(eval.primary_feedback(), Some("ratio"));
    }
}
