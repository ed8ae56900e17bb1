//! Framing gate (priority 1): shot type and subject size.

use framecoach_models::{
    FramingDirective, GateId, GateMetadata, GateResult, MoveDirection, NormalizedRect, ShotType,
    StepSize,
};
use tracing::debug;

use super::{Gate, GateContext};
use crate::error::EngineResult;
use crate::estimators::BodyStructure;

#[derive(Debug, Clone, Copy, Default)]
pub struct FramingGate;

impl Gate for FramingGate {
    type State = ();

    fn id(&self) -> GateId {
        GateId::Framing
    }

    fn evaluate(&self, ctx: &GateContext<'_>, _state: &mut ()) -> EngineResult<GateResult> {
        let threshold = ctx.threshold_for(self.id());
        let Some(reference) = ctx.reference.baseline() else {
            return Ok(GateResult::reference_missing(self.id(), threshold));
        };

        let analysis = ctx.analysis;
        if analysis.no_subject {
            return Ok(GateResult::no_subject(
                self.id(),
                threshold,
                "Cannot recognize subject, step into the frame",
            ));
        }

        let config = ctx.config;
        let reference_structure =
            BodyStructure::extract(&reference.keypoints, config.confidence_threshold);
        let structural_ratio = analysis
            .structure
            .as_ref()
            .zip(reference_structure.as_ref())
            .and_then(|(current, reference)| structural_size_ratio(current, reference));
        let bbox_ratio = ctx
            .live
            .bbox
            .as_ref()
            .zip(reference.bbox.as_ref())
            .and_then(|(current, reference)| bbox_size_ratio(current, reference));
        // Bbox height is the size measure; keypoint span only stands in without one.
        let size_ratio = bbox_ratio.or(structural_ratio);

        let cropped = ctx
            .live
            .bbox
            .map(|b| b.touched_edges(config.framing_edge_margin) >= 2)
            .unwrap_or(false)
            && !reference
                .bbox
                .map(|b| b.touched_edges(config.framing_edge_margin) >= 2)
                .unwrap_or(false);

        let Some(current) = analysis.stable_shot_type else {
            return Ok(GateResult::analyzing(self.id(), threshold, "Analyzing framing…")
                .with_metadata(GateMetadata::Framing {
                    raw: analysis.raw_shot_type,
                    stable: None,
                    reference: reference.shot_type,
                    size_ratio,
                    cropped,
                    directive: None,
                }));
        };

        let same_type = reference.shot_type.map_or(true, |r| r == current);
        let (mut score, directive, mut feedback) = if same_type {
            match size_ratio {
                Some(ratio) if !within_band(ratio, config.framing_size_band) => {
                    let directive = FramingDirective {
                        direction: if ratio > 1.0 {
                            MoveDirection::Forward
                        } else {
                            MoveDirection::Backward
                        },
                        step: StepSize::from_fraction(ratio.ln()),
                    };
                    let feedback = format!("Move {} {}", directive.step, directive.direction);
                    (config.framing_out_of_band_score, Some(directive), feedback)
                }
                _ => (
                    1.0,
                    None,
                    format!("Framing matches ({})", current.display_name()),
                ),
            }
        } else {
            // Only reached with a reference shot type.
            let target = reference.shot_type.unwrap_or(current);
            let delta = current.level_delta(target);
            let score = (1.0 - config.framing_level_penalty * delta.unsigned_abs() as f64).max(0.0);
            let direction = match size_ratio {
                Some(ratio) if ratio > 1.0 => MoveDirection::Forward,
                Some(ratio) if ratio < 1.0 => MoveDirection::Backward,
                _ if delta > 0 => MoveDirection::Backward,
                _ => MoveDirection::Forward,
            };
            let step = match size_ratio {
                Some(ratio) => StepSize::from_fraction(ratio.ln()),
                None => StepSize::from_fraction(0.2 * delta.unsigned_abs() as f64),
            };
            let directive = FramingDirective { direction, step };
            let feedback = format!(
                "Move {} {} for {}",
                step,
                direction,
                with_article(target.display_name())
            );
            (score, Some(directive), feedback)
        };

        if cropped {
            score = score.min(config.framing_cropped_score_cap);
            feedback.push_str(" (too close, cropped)");
        }

        debug!(
            current = %current,
            reference = ?reference.shot_type,
            ?size_ratio,
            cropped,
            score,
            "Framing evaluated"
        );

        Ok(GateResult::new(self.id(), score, threshold, feedback).with_metadata(
            GateMetadata::Framing {
                raw: analysis.raw_shot_type,
                stable: Some(current),
                reference: reference.shot_type,
                size_ratio,
                cropped,
                directive,
            },
        ))
    }
}

/// Reference span over current span; only comparable when the same body
/// tiers are visible in both.
fn structural_size_ratio(current: &BodyStructure, reference: &BodyStructure) -> Option<f64> {
    if current.lowest_tier != reference.lowest_tier || current.span_y <= f64::EPSILON {
        return None;
    }
    let ratio = reference.span_y / current.span_y;
    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}

fn bbox_size_ratio(current: &NormalizedRect, reference: &NormalizedRect) -> Option<f64> {
    if current.height <= f64::EPSILON || reference.height <= 0.0 {
        return None;
    }
    let ratio = reference.height / current.height;
    ratio.is_finite().then_some(ratio)
}

fn within_band(ratio: f64, band: f64) -> bool {
    ratio >= 1.0 / band && ratio <= band
}

fn with_article(name: &str) -> String {
    let article = match name.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    };
    format!("{} {}", article, name)
}

/// Shot type the user is being steered to, if any.
pub fn target_shot_type(metadata: &GateMetadata) -> Option<ShotType> {
    match metadata {
        GateMetadata::Framing {
            stable: Some(stable),
            reference: Some(reference),
            ..
        } if stable != reference => Some(*reference),
        _ => None,
    }
}
