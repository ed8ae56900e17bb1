//! Position gate (priority 2): where the subject sits in the frame.
//!
//! Keypoint structures are compared against the reference structure when
//! both are available. Otherwise the bounding box is scored against the
//! rule-of-thirds gridlines.

use framecoach_models::{
    GateId, GateMetadata, GateResult, HorizontalDirective, MoveDirection, NormalizedRect,
    PositionMode, StepSize, TiltDirection, TiltDirective,
};
use tracing::debug;

use super::{Gate, GateContext};
use crate::error::EngineResult;
use crate::estimators::BodyStructure;

/// Gridlines tested by the rule-of-thirds fallback.
const GRIDLINES: [f64; 3] = [1.0 / 3.0, 0.5, 2.0 / 3.0];

#[derive(Debug, Clone, Copy, Default)]
pub struct PositionGate;

impl Gate for PositionGate {
    type State = ();

    fn id(&self) -> GateId {
        GateId::Position
    }

    fn evaluate(&self, ctx: &GateContext<'_>, _state: &mut ()) -> EngineResult<GateResult> {
        let threshold = ctx.threshold_for(self.id());
        let Some(reference) = ctx.reference.baseline() else {
            return Ok(GateResult::reference_missing(self.id(), threshold));
        };
        if ctx.analysis.no_subject {
            return Ok(GateResult::no_subject(self.id(), threshold, "Subject not detected"));
        }

        let config = ctx.config;
        let reference_structure =
            BodyStructure::extract(&reference.keypoints, config.confidence_threshold);

        if let (Some(current), Some(target)) = (ctx.analysis.structure, reference_structure) {
            // Vertical anchors are only comparable for the same framing.
            let compare_vertical = current.lowest_tier == target.lowest_tier
                && ctx.analysis.stable_shot_type.is_some()
                && ctx.analysis.stable_shot_type == reference.shot_type;

            let dx = current.centroid.x - target.centroid.x;
            let dy = if compare_vertical {
                current.top_anchor_y - target.top_anchor_y
            } else {
                0.0
            };
            return Ok(self.directive_result(
                ctx,
                threshold,
                PositionMode::Keypoints,
                dx,
                compare_vertical.then_some(dy),
            ));
        }

        if let Some(bbox) = ctx.live.bbox.filter(NormalizedRect::is_valid) {
            let center = bbox.center();
            let dx = center.x - nearest_gridline(center.x);
            let dy = center.y - nearest_gridline(center.y);
            return Ok(self.directive_result(ctx, threshold, PositionMode::RuleOfThirds, dx, Some(dy)));
        }

        Ok(GateResult::analyzing(self.id(), threshold, "Analyzing position…"))
    }
}

impl PositionGate {
    /// `dx`/`dy` are the subject's offsets from where it should be, as
    /// fractions of the frame (positive = right/down).
    fn directive_result(
        &self,
        ctx: &GateContext<'_>,
        threshold: f64,
        mode: PositionMode,
        dx: f64,
        dy: Option<f64>,
    ) -> GateResult {
        let config = ctx.config;
        let offset_threshold = ctx.relaxed_tolerance(config.position_offset_threshold);

        let horizontal = (dx.abs() > offset_threshold).then(|| {
            // Panning toward the subject's side brings it back.
            let direction = if dx > 0.0 {
                MoveDirection::Right
            } else {
                MoveDirection::Left
            };
            let direction = if ctx.live.is_front_camera {
                direction.mirrored()
            } else {
                direction
            };
            HorizontalDirective {
                direction,
                step: StepSize::from_fraction(dx * 2.0),
                offset_percent: dx.abs() * 100.0,
            }
        });

        let vertical = dy.filter(|dy| dy.abs() > offset_threshold).map(|dy| TiltDirective {
            // Tilting down moves the subject up in the frame.
            direction: if dy > 0.0 {
                TiltDirection::Down
            } else {
                TiltDirection::Up
            },
            degrees: tilt_degrees(dy.abs() * 100.0),
        });

        let worst = dx.abs().max(dy.unwrap_or(0.0).abs());
        let score = (1.0 - worst / config.position_score_falloff).max(0.0);

        let feedback = match (&horizontal, &vertical, mode) {
            (None, None, _) => "Position matches".to_string(),
            (Some(h), None, PositionMode::Keypoints) => format!("Move {} {}", h.step, h.direction),
            (None, Some(v), _) => format!("Tilt camera {} {:.0}°", v.direction, v.degrees),
            (Some(h), Some(v), PositionMode::Keypoints) => format!(
                "Move {} {} and tilt camera {} {:.0}°",
                h.step, h.direction, v.direction, v.degrees
            ),
            (Some(h), None, PositionMode::RuleOfThirds) => format!(
                "Move {} {:.0}% toward the nearest gridline",
                h.direction, h.offset_percent
            ),
            (Some(h), Some(v), PositionMode::RuleOfThirds) => format!(
                "Move {} {:.0}% and tilt camera {} {:.0}°",
                h.direction, h.offset_percent, v.direction, v.degrees
            ),
        };

        debug!(?mode, dx, ?dy, score, "Position evaluated");

        GateResult::new(self.id(), score, threshold, feedback).with_metadata(GateMetadata::Position {
            mode,
            horizontal,
            vertical,
        })
    }
}

/// Tilt angle for a vertical offset given in percent of frame height.
pub fn tilt_degrees(percent: f64) -> f64 {
    let percent = percent.abs();
    if percent < 5.0 {
        2.0
    } else if percent < 10.0 {
        5.0
    } else if percent < 15.0 {
        8.0
    } else if percent < 20.0 {
        10.0
    } else {
        (percent / 2.0).clamp(10.0, 15.0)
    }
}

fn nearest_gridline(value: f64) -> f64 {
    GRIDLINES
        .iter()
        .copied()
        .min_by(|a, b| (a - value).abs().total_cmp(&(b - value).abs()))
        .unwrap_or(0.5)
}
