//! Lens/distance gate (priority 3).
//!
//! Compares the equivalent focal length and the subject distance against
//! the reference. Distance is estimated from EMA-smoothed shoulder keypoints
//! with the pinhole model, and the resulting feedback is debounced so the
//! message does not flicker with every small change in the estimate.

use framecoach_models::{
    GateId, GateMetadata, GateResult, LensAction, MoveDirection, ZoomDirection,
};
use tracing::debug;

use super::{Gate, GateContext};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::estimators::{estimate_distance_m, ShoulderSmoother};
use crate::stabilizers::{DebounceInput, GuidanceDebouncer};

/// Focal difference (mm) at which the focal term reaches zero.
const FOCAL_FALLOFF_MM: f64 = 50.0;
/// Distance difference (m) at which the distance term reaches zero.
const DISTANCE_FALLOFF_M: f64 = 2.0;
/// Upper bound for any score that still carries a directive.
const OFF_TARGET_SCORE_CAP: f64 = 0.79;

/// Per-session state of the lens/distance gate.
#[derive(Debug, Clone)]
pub struct LensDistanceState {
    smoother: ShoulderSmoother,
    debouncer: GuidanceDebouncer,
}

impl Default for LensDistanceState {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl LensDistanceState {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            smoother: ShoulderSmoother::from_config(config),
            debouncer: GuidanceDebouncer::from_config(config),
        }
    }

    pub fn reset(&mut self) {
        self.smoother.reset();
        self.debouncer.reset();
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LensDistanceGate;

impl Gate for LensDistanceGate {
    type State = LensDistanceState;

    fn id(&self) -> GateId {
        GateId::LensDistance
    }

    fn evaluate(
        &self,
        ctx: &GateContext<'_>,
        state: &mut LensDistanceState,
    ) -> EngineResult<GateResult> {
        let threshold = ctx.threshold_for(self.id());
        let Some(reference) = ctx.reference.baseline() else {
            return Ok(GateResult::reference_missing(self.id(), threshold));
        };
        if ctx.analysis.no_subject {
            return Ok(GateResult::no_subject(self.id(), threshold, "Subject not detected"));
        }

        let config = ctx.config;
        let current_focal = ctx.resolver.focal_length_mm(ctx.settings.current_zoom_factor)?;
        let reference_focal = reference.focal_length.mm();
        let estimated = reference.focal_length.is_estimated();

        let focal_tolerance = ctx.relaxed_tolerance(if estimated {
            config.estimated_focal_tolerance_mm
        } else {
            config.focal_tolerance_mm
        });
        let distance_tolerance = ctx.relaxed_tolerance(config.distance_tolerance_m);

        let image_width = f64::from(ctx.live.image_size.width);
        let current_distance = state.smoother.update(&ctx.live.keypoints).and_then(|(left, right)| {
            estimate_distance_m(
                (left.x - right.x).abs() * image_width,
                image_width,
                current_focal,
                ctx.settings.body_type.shoulder_width_m(),
            )
        });
        let reference_distance = reference.estimated_distance_m;

        let focal_delta = current_focal - reference_focal;
        let zoom = (focal_delta.abs() > focal_tolerance)
            .then(|| -> EngineResult<_> {
                let direction = if focal_delta > 0.0 {
                    ZoomDirection::Out
                } else {
                    ZoomDirection::In
                };
                Ok((direction, ctx.resolver.zoom_for_focal_length(reference_focal)?))
            })
            .transpose()?;

        let focal_term = (1.0 - focal_delta.abs() / FOCAL_FALLOFF_MM).max(0.0);

        let (action, score) = match (current_distance, reference_distance) {
            (Some(current), Some(target)) => {
                let distance_delta = current - target;
                let step = (distance_delta.abs() > distance_tolerance).then(|| {
                    let direction = if distance_delta > 0.0 {
                        MoveDirection::Forward
                    } else {
                        MoveDirection::Backward
                    };
                    (direction, distance_delta.abs())
                });
                let distance_term = (1.0 - distance_delta.abs() / DISTANCE_FALLOFF_M).max(0.0);
                let score =
                    config.focal_weight * focal_term + (1.0 - config.focal_weight) * distance_term;

                let action = match (step, zoom) {
                    (None, None) => LensAction::Matched,
                    (None, Some((direction, target_zoom))) => LensAction::Zoom {
                        direction,
                        target_zoom,
                    },
                    (Some((direction, meters)), None) => LensAction::Step { direction, meters },
                    (Some((step, meters)), Some((zoom, target_zoom))) => LensAction::StepAndZoom {
                        step,
                        meters,
                        zoom,
                        target_zoom,
                    },
                };
                (action, score)
            }
            // Without a reference distance only the lens can be compared.
            (_, None) => match zoom {
                Some((direction, target_zoom)) => (
                    LensAction::Zoom {
                        direction,
                        target_zoom,
                    },
                    focal_term,
                ),
                None => (LensAction::Matched, focal_term),
            },
            (None, Some(_)) => match zoom {
                Some((direction, target_zoom)) => (
                    LensAction::Zoom {
                        direction,
                        target_zoom,
                    },
                    focal_term,
                ),
                None => {
                    return Ok(GateResult::analyzing(self.id(), threshold, "Measuring distance…")
                        .with_metadata(GateMetadata::LensDistance {
                            current_focal_mm: current_focal,
                            reference_focal_mm: reference_focal,
                            current_distance_m: None,
                            reference_distance_m: reference_distance,
                            action: LensAction::Matched,
                            estimated_reference: estimated,
                        }));
                }
            },
        };

        let score = match action {
            LensAction::Matched => score.max(threshold),
            _ => score.min(OFF_TARGET_SCORE_CAP),
        };

        let mut instant = describe(&action);
        if estimated && action != LensAction::Matched {
            instant.push_str(" (estimated)");
        }

        let outcome = state.debouncer.update(
            DebounceInput {
                message: &instant,
                category: action.category(),
                distance_m: current_distance,
                focal_mm: Some(current_focal),
            },
            ctx.live.timestamp,
        );

        debug!(
            current_focal,
            reference_focal,
            ?current_distance,
            ?reference_distance,
            action = action.category(),
            score,
            debounced = !outcome.updated,
            "Lens/distance evaluated"
        );

        let mut result = GateResult::new(self.id(), score, threshold, outcome.message);
        if !outcome.updated && result.feedback != instant {
            result = result.with_debug(format!("instant: {}", instant));
        }
        Ok(result.with_metadata(GateMetadata::LensDistance {
            current_focal_mm: current_focal,
            reference_focal_mm: reference_focal,
            current_distance_m: current_distance,
            reference_distance_m: reference_distance,
            action,
            estimated_reference: estimated,
        }))
    }
}

/// Instantaneous feedback text for an action.
///
/// A zoom that fights the step is a perspective change, so the zoom is
/// given first and the step corrects the size afterwards.
pub fn describe(action: &LensAction) -> String {
    match *action {
        LensAction::Matched => "Lens and distance match".to_string(),
        LensAction::Zoom {
            direction,
            target_zoom,
        } => zoom_phrase(direction, target_zoom),
        LensAction::Step { direction, meters } => step_phrase(direction, meters),
        LensAction::StepAndZoom {
            step,
            meters,
            zoom,
            target_zoom,
        } => {
            if zooms_first(step, zoom) {
                format!(
                    "{}, then {}",
                    zoom_phrase(zoom, target_zoom),
                    lowercase_first(&step_phrase(step, meters))
                )
            } else {
                format!(
                    "{}, then {}",
                    step_phrase(step, meters),
                    lowercase_first(&zoom_phrase(zoom, target_zoom))
                )
            }
        }
    }
}

/// Whether a combined step-and-zoom is announced zoom first: true when the
/// two pull the subject size in opposite directions.
pub fn zooms_first(step: MoveDirection, zoom: ZoomDirection) -> bool {
    let zoom_enlarges = zoom == ZoomDirection::In;
    let step_enlarges = step == MoveDirection::Forward;
    zoom_enlarges != step_enlarges
}

fn zoom_phrase(direction: ZoomDirection, target_zoom: f64) -> String {
    match direction {
        ZoomDirection::In => format!("Zoom in to {:.1}x", target_zoom),
        ZoomDirection::Out => format!("Zoom out to {:.1}x", target_zoom),
    }
}

fn step_phrase(direction: MoveDirection, meters: f64) -> String {
    format!("Move {} about {:.1}m", direction, meters)
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
