//! Pose gate (priority 4).
//!
//! The per-part angle differences come from an external pose comparison;
//! this gate only scores them and picks which parts to talk about.

use framecoach_models::{GateId, GateMetadata, GateResult, PoseViolation};
use tracing::debug;

use super::{Gate, GateContext};
use crate::error::EngineResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct PoseGate;

impl Gate for PoseGate {
    type State = ();

    fn id(&self) -> GateId {
        GateId::Pose
    }

    fn evaluate(&self, ctx: &GateContext<'_>, _state: &mut ()) -> EngineResult<GateResult> {
        let threshold = ctx.threshold_for(self.id());
        if !ctx.reference.is_set() {
            return Ok(GateResult::reference_missing(self.id(), threshold));
        }
        if ctx.analysis.no_subject {
            return Ok(GateResult::no_subject(self.id(), threshold, "Subject not detected"));
        }

        let Some(comparison) = ctx
            .live
            .pose_comparison
            .as_ref()
            .filter(|c| !c.parts.is_empty())
        else {
            return Ok(GateResult::analyzing(self.id(), threshold, "Analyzing pose…"));
        };

        let tolerance = ctx.relaxed_tolerance(ctx.config.pose_angle_tolerance_deg);
        let within = comparison
            .parts
            .iter()
            .filter(|p| p.angle_diff_deg.abs() <= tolerance)
            .count();
        let score = within as f64 / comparison.parts.len() as f64;

        let mut violations: Vec<PoseViolation> = comparison
            .parts
            .iter()
            .filter(|p| p.angle_diff_deg.abs() > tolerance)
            .map(|p| PoseViolation {
                part: p.part,
                angle_diff_deg: p.angle_diff_deg,
                message: p
                    .hint
                    .clone()
                    .filter(|h| !h.trim().is_empty())
                    .unwrap_or_else(|| p.part.fallback_hint().to_string()),
            })
            .collect();
        violations.sort_by_key(|v| v.part.priority());
        violations.truncate(ctx.config.pose_max_violations);

        let feedback = if score >= threshold || violations.is_empty() {
            "Pose matches".to_string()
        } else {
            violations
                .iter()
                .map(|v| v.message.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };

        debug!(score, tolerance, violations = violations.len(), "Pose evaluated");

        Ok(GateResult::new(self.id(), score, threshold, feedback)
            .with_metadata(GateMetadata::Pose { violations }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::estimators::fixtures::full_body;
    use crate::gates::testing::{reference, resolver, settled_analysis, PORTRAIT};
    use framecoach_models::{
        BodyPart, GateCategory, GateSettings, Keypoints, LiveMetrics, PartDifference,
        PoseComparison,
    };

    fn part(part: BodyPart, angle: f64, hint: Option<&str>) -> PartDifference {
        PartDifference {
            part,
            angle_diff_deg: angle,
            hint: hint.map(str::to_string),
        }
    }

    fn run(live: &LiveMetrics, multiplier: f64) -> GateResult {
        let reference = reference(full_body(0.5, 0.1, 0.9), None);
        let analysis = settled_analysis(live);
        let config = EngineConfig::default();
        let settings = GateSettings {
            difficulty_multiplier: multiplier,
            ..GateSettings::default()
        };
        let resolver = resolver();
        let ctx = GateContext {
            live,
            reference: &reference,
            settings: &settings,
            analysis: &analysis,
            config: &config,
            resolver: &resolver,
        };
        PoseGate.evaluate(&ctx, &mut ()).unwrap()
    }

    fn live_with(parts: Vec<PartDifference>) -> LiveMetrics {
        LiveMetrics::new(0.0, full_body(0.5, 0.1, 0.9), PORTRAIT)
            .with_pose_comparison(PoseComparison { parts })
    }

    #[test]
    fn test_score_is_fraction_within_tolerance() {
        let live = live_with(vec![
            part(BodyPart::LeftArm, 5.0, None),
            part(BodyPart::RightArm, 10.0, None),
            part(BodyPart::LeftLeg, 30.0, None),
            part(BodyPart::RightLeg, -14.0, None),
        ]);
        let result = run(&live, 1.0);
        assert!((result.score - 0.75).abs() < 1e-9);
        assert!(result.passed);
        assert_eq!(result.feedback, "Pose matches");
    }

    #[test]
    fn test_reports_two_violations_by_priority() {
        let live = live_with(vec![
            part(BodyPart::RightHand, 40.0, Some("Open your right hand")),
            part(BodyPart::LeftArm, 25.0, Some("Raise your left arm")),
            part(BodyPart::ShoulderTilt, 20.0, None),
            part(BodyPart::Face, 3.0, None),
        ]);
        let result = run(&live, 1.0);
        assert!(!result.passed);
        assert_eq!(
            result.feedback,
            "Level your shoulders like the reference, Raise your left arm"
        );
        match result.metadata {
            Some(GateMetadata::Pose { violations }) => assert_eq!(violations.len(), 2),
            other => panic!("unexpected metadata {:?}", other),
        }
    }

    #[test]
    fn test_difficulty_widens_tolerance() {
        // 18 degrees fails at 15, passes at 15 * 1.25 = 18.75
        let live = live_with(vec![part(BodyPart::LeftLeg, 18.0, None)]);
        assert_eq!(run(&live, 1.0).score, 0.0);
        assert_eq!(run(&live, 1.5).score, 1.0);
    }

    #[test]
    fn test_missing_comparison_is_analyzing() {
        let live = LiveMetrics::new(0.0, full_body(0.5, 0.1, 0.9), PORTRAIT);
        let result = run(&live, 1.0);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.category, GateCategory::Analyzing);
    }

    #[test]
    fn test_no_subject() {
        let live = LiveMetrics::new(0.0, Keypoints::default(), PORTRAIT);
        let result = run(&live, 1.0);
        assert_eq!(result.category, GateCategory::NoSubject);
        assert_eq!(result.feedback, "Subject not detected");
    }
}
