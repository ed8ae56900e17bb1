//! Gate orchestrator.
//!
//! Runs the five gates in ascending priority against one immutable context
//! and assembles the [`GateEvaluation`]. A gate that fails never aborts the
//! frame; it is replaced by an error result.

use std::time::Instant;

use framecoach_models::{
    GateEvaluation, GateId, GateResult, GateSettings, LiveMetrics, ReferenceState, ShotType,
};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::estimators::{classify_shot_type, BodyStructure, FocalLengthResolver};
use crate::gates::{
    AspectRatioGate, FramingGate, Gate, GateContext, LensDistanceGate, LensDistanceState,
    PoseGate, PositionGate,
};
use crate::metrics;
use crate::stabilizers::ShotTypeHysteresis;

/// Per-frame facts shared by several gates, computed once.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub structure: Option<BodyStructure>,
    pub raw_shot_type: Option<ShotType>,
    /// Shot type after hysteresis; shared by framing and position.
    pub stable_shot_type: Option<ShotType>,
    pub no_subject: bool,
}

impl FrameAnalysis {
    /// Too few confident keypoints and a negligible bounding box.
    pub fn is_no_subject(live: &LiveMetrics, config: &EngineConfig) -> bool {
        live.keypoints.confident_count(config.confidence_threshold) < config.no_subject_min_keypoints
            && live.bbox_area() < config.no_subject_min_bbox_area
    }

    /// Analyze one frame, advancing the shot type hysteresis.
    pub fn analyze(
        live: &LiveMetrics,
        config: &EngineConfig,
        hysteresis: &mut ShotTypeHysteresis,
    ) -> Self {
        let no_subject = Self::is_no_subject(live, config);
        let raw_shot_type = if no_subject {
            None
        } else {
            classify_shot_type(&live.keypoints, live.bbox.as_ref(), config.confidence_threshold)
        };
        let stable_shot_type = hysteresis.update(raw_shot_type);

        Self {
            structure: BodyStructure::extract(&live.keypoints, config.confidence_threshold),
            raw_shot_type,
            stable_shot_type,
            no_subject,
        }
    }
}

/// Runs the gates for one session.
#[derive(Debug, Clone)]
pub struct GateOrchestrator {
    config: EngineConfig,
    resolver: FocalLengthResolver,
    lens_state: LensDistanceState,
    shot_hysteresis: ShotTypeHysteresis,
}

impl GateOrchestrator {
    pub fn new(config: EngineConfig) -> Self {
        let resolver = FocalLengthResolver::for_device(&config.device_model);
        Self {
            lens_state: LensDistanceState::from_config(&config),
            shot_hysteresis: ShotTypeHysteresis::new(config.shot_hysteresis_frames),
            resolver,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The lens table every zoom/focal conversion goes through.
    pub fn resolver(&self) -> &FocalLengthResolver {
        &self.resolver
    }

    /// Evaluate one frame.
    pub fn evaluate(
        &mut self,
        live: &LiveMetrics,
        reference: &ReferenceState,
        settings: &GateSettings,
    ) -> GateEvaluation {
        let started = Instant::now();
        let analysis = FrameAnalysis::analyze(live, &self.config, &mut self.shot_hysteresis);
        let ctx = GateContext {
            live,
            reference,
            settings,
            analysis: &analysis,
            config: &self.config,
            resolver: &self.resolver,
        };

        let short_circuit = analysis.no_subject && reference.is_set();
        if short_circuit {
            metrics::record_no_subject();
        }

        let mut results = Vec::with_capacity(GateId::ALL.len());
        results.push(run_gate(&AspectRatioGate, &ctx, &mut ()));
        if short_circuit {
            results.extend(GateId::ALL.into_iter().skip(1).map(|gate| {
                GateResult::no_subject(gate, ctx.threshold_for(gate), "Cannot recognize subject")
            }));
        } else {
            results.push(run_gate(&FramingGate, &ctx, &mut ()));
            results.push(run_gate(&PositionGate, &ctx, &mut ()));
            results.push(run_gate(&LensDistanceGate, &ctx, &mut self.lens_state));
            results.push(run_gate(&PoseGate, &ctx, &mut ()));
        }

        for result in &results {
            metrics::record_gate_result(result);
        }

        let evaluation = GateEvaluation::assemble(results);
        let current_shot_type = evaluation
            .framing
            .metadata
            .as_ref()
            .and_then(|m| m.detected_shot_type())
            .or(analysis.stable_shot_type);
        let reference_shot_type = reference.baseline().and_then(|r| r.shot_type);
        let evaluation = evaluation.with_shot_types(current_shot_type, reference_shot_type);

        metrics::record_frame(&evaluation, started.elapsed().as_secs_f64());
        debug!(
            timestamp = live.timestamp,
            passed = evaluation.passed_count(),
            failed_gate = ?evaluation.current_failed_gate(),
            shot_type = ?current_shot_type,
            "Frame evaluated"
        );

        evaluation
    }

    /// Clear all gate state and the shot type hysteresis.
    pub fn reset(&mut self) {
        self.lens_state.reset();
        self.shot_hysteresis.reset();
    }
}

fn run_gate<G: Gate>(gate: &G, ctx: &GateContext<'_>, state: &mut G::State) -> GateResult {
    gate.evaluate(ctx, state).unwrap_or_else(|e| {
        warn!(gate = gate.id().as_str(), error = %e, "Gate failed, using fallback result");
        metrics::record_gate_error(gate.id().as_str());
        GateResult::error(gate.id(), e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimators::fixtures::{cut_below, full_body};
    use crate::gates::testing::{reference, PORTRAIT};
    use framecoach_models::{GateCategory, ImageSize, Keypoints};

    #[test]
    fn test_no_reference_is_idle() {
        let mut orchestrator = GateOrchestrator::new(EngineConfig::default());
        let live = LiveMetrics::new(0.0, full_body(0.5, 0.1, 0.9), PORTRAIT);
        let eval = orchestrator.evaluate(&live, &ReferenceState::Unset, &GateSettings::default());

        assert!(eval.aspect_ratio.passed);
        assert_eq!(eval.framing.category, GateCategory::Idle);
        assert_eq!(eval.pose.category, GateCategory::Idle);
        assert!(!eval.all_passed());
    }

    #[test]
    fn test_no_subject_short_circuits_downstream_gates() {
        let mut orchestrator = GateOrchestrator::new(EngineConfig::default());
        let reference = reference(full_body(0.5, 0.1, 0.9), None);
        let live = LiveMetrics::new(0.0, Keypoints::default(), PORTRAIT);
        let eval = orchestrator.evaluate(&live, &reference, &GateSettings::default());

        assert!(eval.aspect_ratio.passed);
        for gate in [GateId::Framing, GateId::Position, GateId::LensDistance, GateId::Pose] {
            let result = eval.get(gate);
            assert_eq!(result.category, GateCategory::NoSubject, "{}", gate);
            assert_eq!(result.score, 0.0);
        }
        assert_eq!(eval.primary_feedback(), Some("Cannot recognize subject"));
    }

    #[test]
    fn test_gate_error_becomes_fallback() {
        let mut orchestrator = GateOrchestrator::new(EngineConfig::default());
        let reference = reference(full_body(0.5, 0.1, 0.9), None);
        let live = LiveMetrics::new(0.0, full_body(0.5, 0.1, 0.9), PORTRAIT);
        let settings = GateSettings {
            current_zoom_factor: 0.0,
            ..GateSettings::default()
        };
        let eval = orchestrator.evaluate(&live, &reference, &settings);

        assert_eq!(eval.lens_distance.category, GateCategory::Error);
        assert_eq!(eval.lens_distance.score, 0.0);
        assert!(eval.lens_distance.debug_info.is_some());
        // Other gates are unaffected.
        assert!(eval.aspect_ratio.passed);
    }

    #[test]
    fn test_degenerate_image_still_produces_evaluation() {
        let mut orchestrator = GateOrchestrator::new(EngineConfig::default());
        let reference = reference(full_body(0.5, 0.1, 0.9), None);
        let live = LiveMetrics::new(0.0, full_body(0.5, 0.1, 0.9), ImageSize::new(0, 0));
        let eval = orchestrator.evaluate(&live, &reference, &GateSettings::default());
        assert_eq!(eval.aspect_ratio.category, GateCategory::Error);
    }

    #[test]
    fn test_shot_type_needs_three_frames() {
        let mut orchestrator = GateOrchestrator::new(EngineConfig::default());
        let reference = reference(full_body(0.5, 0.1, 0.9), None);
        let live = LiveMetrics::new(0.0, cut_below(&full_body(0.5, 0.1, 1.6), 0.8), PORTRAIT);
        let settings = GateSettings::default();

        for _ in 0..2 {
            let eval = orchestrator.evaluate(&live, &reference, &settings);
            assert_eq!(eval.framing.category, GateCategory::Analyzing);
            assert_eq!(eval.current_shot_type, None);
        }
        let eval = orchestrator.evaluate(&live, &reference, &settings);
        assert_eq!(eval.current_shot_type, Some(ShotType::MediumCloseUp));
        assert_eq!(eval.reference_shot_type, Some(ShotType::FullShot));

        orchestrator.reset();
        let eval = orchestrator.evaluate(&live, &reference, &settings);
        assert_eq!(eval.current_shot_type, None);
    }
}
