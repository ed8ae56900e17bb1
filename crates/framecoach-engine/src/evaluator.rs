//! Unified evaluator façade.
//!
//! One instance per shooting session. It owns the reference baseline, the
//! orchestrator and every stabilizer, and turns a live frame into the single
//! published [`EvaluationResult`].

use framecoach_models::{
    BodyType, EvaluationResult, GateSettings, GuideStage, GuideType, LiveMetrics,
    ReferenceAnalysis, ReferenceData, ReferenceState, SimpleGuideResult, StabilityState,
};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::guide::select_guide;
use crate::metrics;
use crate::orchestrator::GateOrchestrator;
use crate::reference::build_reference;
use crate::stabilizers::{ActiveFeedback, AdaptiveDifficulty, GuideHysteresis, TemporalLock};

type GuideKey = (GuideStage, GuideType);

#[derive(Debug)]
pub struct UnifiedEvaluator {
    config: EngineConfig,
    orchestrator: GateOrchestrator,
    reference: ReferenceState,
    settings: GateSettings,
    guide_hysteresis: GuideHysteresis<GuideKey>,
    /// Last raw guide per emitted key, shown while hysteresis holds it.
    held_guide: Option<SimpleGuideResult>,
    feedback: ActiveFeedback,
    lock: TemporalLock,
    difficulty: AdaptiveDifficulty,
    latest: Option<EvaluationResult>,
}

impl UnifiedEvaluator {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            orchestrator: GateOrchestrator::new(config.clone()),
            reference: ReferenceState::Unset,
            settings: GateSettings::default(),
            guide_hysteresis: GuideHysteresis::new(
                config.guide_hysteresis_frames,
                config.guide_force_unstick_secs,
            ),
            held_guide: None,
            feedback: ActiveFeedback::from_config(&config),
            lock: TemporalLock::new(config.lock_duration_secs),
            difficulty: AdaptiveDifficulty::from_config(&config),
            latest: None,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reference(&self) -> &ReferenceState {
        &self.reference
    }

    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    /// Replace the reference wholesale and reset every stateful component.
    pub fn set_reference(&mut self, reference: ReferenceData) {
        info!(
            shot_type = ?reference.shot_type,
            aspect_ratio = %reference.aspect_ratio,
            "Reference set"
        );
        self.reference = reference.into();
        self.reset_state();
        metrics::record_reference_change("set");
    }

    /// Build a baseline from a reference analysis and install it.
    pub fn build_and_set_reference(&mut self, analysis: &ReferenceAnalysis) -> EngineResult<()> {
        let reference = build_reference(
            analysis,
            self.orchestrator.resolver(),
            &self.settings,
            &self.config,
        )?;
        self.set_reference(reference);
        Ok(())
    }

    /// Return to idle.
    pub fn clear_reference(&mut self) {
        if self.reference.is_set() {
            info!("Reference cleared");
        }
        self.reference = ReferenceState::Unset;
        self.reset_state();
        metrics::record_reference_change("clear");
    }

    /// Update the camera zoom; rejected when the lens table cannot resolve it.
    pub fn set_zoom_factor(&mut self, zoom: f64) -> EngineResult<()> {
        self.orchestrator.resolver().focal_length_mm(zoom)?;
        self.settings.current_zoom_factor = zoom;
        Ok(())
    }

    pub fn set_body_type(&mut self, body_type: BodyType) {
        self.settings.body_type = body_type;
    }

    /// Evaluate one live frame. Always produces a well-formed result.
    pub fn evaluate(&mut self, live: &LiveMetrics) -> EvaluationResult {
        let now = live.timestamp;
        self.settings.difficulty_multiplier = self.difficulty.multiplier();

        let gate_evaluation = self.orchestrator.evaluate(live, &self.reference, &self.settings);

        let result = if !self.reference.is_set() {
            let stability = self.lock.update(false, now);
            EvaluationResult {
                timestamp: now,
                guide: self.feedback.update(&SimpleGuideResult::idle(), now),
                gate_evaluation,
                is_perfect: false,
                stability,
                difficulty_multiplier: self.settings.difficulty_multiplier,
            }
        } else {
            let raw = select_guide(&gate_evaluation);
            let guide = self.stabilize_guide(raw, now);
            let guide = self.feedback.update(&guide, now);

            // The lock sees the raw verdict, never the held guide.
            let stability = self.lock.update(gate_evaluation.all_passed(), now);
            self.difficulty.update(&gate_evaluation, now);

            EvaluationResult {
                timestamp: now,
                guide,
                is_perfect: stability.state == StabilityState::Locked,
                stability,
                difficulty_multiplier: self.difficulty.multiplier(),
                gate_evaluation,
            }
        };

        debug!(
            timestamp = now,
            stage = result.guide.stage.as_str(),
            guide = result.guide.guide_type.as_str(),
            progress = result.stability.progress,
            is_perfect = result.is_perfect,
            "Evaluation published"
        );

        self.latest = Some(result.clone());
        result
    }

    /// Most recent published result.
    pub fn latest(&self) -> Option<&EvaluationResult> {
        self.latest.as_ref()
    }

    /// Hold-still progress in [0, 1]; 1.0 signals capture readiness.
    pub fn stability_progress(&self) -> f64 {
        self.lock.progress()
    }

    pub fn difficulty_multiplier(&self) -> f64 {
        self.difficulty.multiplier()
    }

    /// Release the lock, e.g. after a capture.
    pub fn reset_lock(&mut self) {
        self.lock.reset();
    }

    fn stabilize_guide(&mut self, raw: SimpleGuideResult, now: f64) -> SimpleGuideResult {
        let key = (raw.stage, raw.guide_type);
        let emitted = self.guide_hysteresis.update(key, now);
        if emitted == key {
            self.held_guide = Some(raw.clone());
            return raw;
        }
        match &self.held_guide {
            Some(held) if (held.stage, held.guide_type) == emitted => held.clone(),
            _ => raw,
        }
    }

    fn reset_state(&mut self) {
        self.orchestrator.reset();
        self.guide_hysteresis.reset();
        self.held_guide = None;
        self.feedback.reset();
        self.lock.reset();
        self.difficulty.reset();
        self.settings.difficulty_multiplier = 1.0;
        self.latest = None;
    }
}

impl Default for UnifiedEvaluator {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::estimators::fixtures::full_body;
    use crate::gates::testing::PORTRAIT;
    use framecoach_models::{
        BodyPart, PartDifference, PoseComparison, ReferenceFocalLength,
    };

    fn analysis() -> ReferenceAnalysis {
        ReferenceAnalysis {
            keypoints: full_body(0.5, 0.1, 0.9),
            bbox: None,
            image_size: PORTRAIT,
            aspect_ratio: None,
            focal_length: ReferenceFocalLength::Exif { mm: 26.0 },
            zoom_factor: None,
            compression_index: None,
        }
    }

    fn matching_frame(t: f64) -> LiveMetrics {
        LiveMetrics::new(t, full_body(0.5, 0.1, 0.9), PORTRAIT).with_pose_comparison(
            PoseComparison {
                parts: vec![PartDifference {
                    part: BodyPart::LeftArm,
                    angle_diff_deg: 2.0,
                    hint: None,
                }],
            },
        )
    }

    #[test]
    fn test_idle_without_reference() {
        let mut evaluator = UnifiedEvaluator::default();
        let result = evaluator.evaluate(&matching_frame(0.0));
        assert_eq!(result.guide.stage, GuideStage::Idle);
        assert!(!result.is_perfect);
        assert_eq!(result.stability_progress(), 0.0);
        assert!(evaluator.latest().is_some());
    }

    #[test]
    fn test_matching_scene_locks() {
        let mut evaluator = UnifiedEvaluator::default();
        evaluator.build_and_set_reference(&analysis()).unwrap();

        let mut locked_at = None;
        for i in 0..12 {
            let t = i as f64 * 0.1;
            let result = evaluator.evaluate(&matching_frame(t));
            if result.is_perfect && locked_at.is_none() {
                locked_at = Some(t);
            }
        }
        // Shot type settles on the third frame (t=0.2), lock after 0.5s more.
        let locked_at = locked_at.unwrap();
        assert!((locked_at - 0.7).abs() < 1e-9, "locked at {}", locked_at);
        assert_eq!(evaluator.stability_progress(), 1.0);
        let latest = evaluator.latest().unwrap();
        assert_eq!(latest.guide.stage, GuideStage::Perfect);
    }

    #[test]
    fn test_reference_switch_resets_everything() {
        let mut evaluator = UnifiedEvaluator::default();
        evaluator.build_and_set_reference(&analysis()).unwrap();
        for i in 0..10 {
            evaluator.evaluate(&matching_frame(i as f64 * 0.1));
        }
        assert_eq!(evaluator.stability_progress(), 1.0);

        evaluator.build_and_set_reference(&analysis()).unwrap();
        assert_eq!(evaluator.stability_progress(), 0.0);
        assert!(evaluator.latest().is_none());

        // Shot type hysteresis starts over as well.
        let result = evaluator.evaluate(&matching_frame(2.0));
        assert_eq!(result.gate_evaluation.current_shot_type, None);
        assert!(!result.is_perfect);
    }

    #[test]
    fn test_clear_reference_returns_to_idle() {
        let mut evaluator = UnifiedEvaluator::default();
        evaluator.build_and_set_reference(&analysis()).unwrap();
        evaluator.evaluate(&matching_frame(0.0));
        evaluator.clear_reference();
        assert!(!evaluator.reference().is_set());
        let result = evaluator.evaluate(&matching_frame(0.1));
        assert_eq!(result.guide.stage, GuideStage::Idle);
    }

    #[test]
    fn test_reset_lock_after_capture() {
        let mut evaluator = UnifiedEvaluator::default();
        evaluator.build_and_set_reference(&analysis()).unwrap();
        for i in 0..10 {
            evaluator.evaluate(&matching_frame(i as f64 * 0.1));
        }
        evaluator.reset_lock();
        assert_eq!(evaluator.stability_progress(), 0.0);
        let result = evaluator.evaluate(&matching_frame(1.0));
        assert_eq!(result.stability.state, StabilityState::Arming { started_at: 1.0 });
    }

    #[test]
    fn test_zoom_validation() {
        let mut evaluator = UnifiedEvaluator::default();
        assert!(matches!(
            evaluator.set_zoom_factor(-1.0),
            Err(EngineError::InvalidZoom(_))
        ));
        evaluator.set_zoom_factor(2.0).unwrap();
        assert_eq!(evaluator.settings().current_zoom_factor, 2.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            framing_threshold: 1.5,
            ..EngineConfig::default()
        };
        assert!(UnifiedEvaluator::new(config).is_err());
    }
}
