//! Sequential "one thing at a time" guide.
//!
//! Walks the stages in a fixed order and reports the first one that is not
//! satisfied: aspect ratio, frame entry, shot type, position, distance/zoom,
//! pose, and finally perfect.

use framecoach_models::{
    GateCategory, GateEvaluation, GateMetadata, GateResult, GuideStage, GuideType, LensAction,
    MoveDirection, SimpleGuideResult, TiltDirection, ZoomDirection,
};

use crate::gates::lens_distance::zooms_first;

/// Message shown once every stage is satisfied.
pub const PERFECT_MESSAGE: &str = "Perfect! Hold still";

/// Pick the single directive for this frame.
pub fn select_guide(evaluation: &GateEvaluation) -> SimpleGuideResult {
    if evaluation.iter().any(|r| r.category == GateCategory::Idle) {
        return SimpleGuideResult::idle();
    }

    let aspect = &evaluation.aspect_ratio;
    if !aspect.passed {
        let guide_type = match aspect.category {
            GateCategory::Error => GuideType::Waiting,
            _ => GuideType::ChangeAspectRatio,
        };
        return guide(GuideStage::AspectRatio, guide_type, aspect);
    }

    if let Some(missing) = evaluation
        .iter()
        .find(|r| r.category == GateCategory::NoSubject)
    {
        return guide(GuideStage::FrameEntry, GuideType::EnterFrame, missing);
    }

    let framing = &evaluation.framing;
    if !framing.passed {
        let guide_type = match &framing.metadata {
            Some(GateMetadata::Framing {
                directive: Some(directive),
                ..
            }) => move_type(directive.direction),
            _ => GuideType::Waiting,
        };
        return guide(GuideStage::ShotType, guide_type, framing);
    }

    let position = &evaluation.position;
    if !position.passed {
        let guide_type = match &position.metadata {
            Some(GateMetadata::Position {
                horizontal: Some(horizontal),
                ..
            }) => move_type(horizontal.direction),
            Some(GateMetadata::Position {
                vertical: Some(vertical),
                ..
            }) => match vertical.direction {
                TiltDirection::Up => GuideType::TiltUp,
                TiltDirection::Down => GuideType::TiltDown,
            },
            _ => GuideType::Waiting,
        };
        return guide(GuideStage::Position, guide_type, position);
    }

    let lens = &evaluation.lens_distance;
    if !lens.passed {
        let guide_type = match &lens.metadata {
            Some(GateMetadata::LensDistance { action, .. })
                if lens.category == GateCategory::LensDistance =>
            {
                match *action {
                    LensAction::Zoom { direction, .. } => zoom_type(direction),
                    LensAction::Step { direction, .. } => move_type(direction),
                    LensAction::StepAndZoom { step, zoom, .. } => {
                        if zooms_first(step, zoom) {
                            zoom_type(zoom)
                        } else {
                            move_type(step)
                        }
                    }
                    LensAction::Matched => GuideType::Waiting,
                }
            }
            _ => GuideType::Waiting,
        };
        return guide(GuideStage::DistanceZoom, guide_type, lens);
    }

    let pose = &evaluation.pose;
    if !pose.passed {
        let guide_type = match pose.category {
            GateCategory::Pose => GuideType::AdjustPose,
            _ => GuideType::Waiting,
        };
        return guide(GuideStage::Pose, guide_type, pose);
    }

    SimpleGuideResult {
        stage: GuideStage::Perfect,
        guide_type: GuideType::Perfect,
        message: PERFECT_MESSAGE.to_string(),
        progress: 1.0,
        displayed_progress: 1.0,
        is_resolved: false,
    }
}

fn guide(stage: GuideStage, guide_type: GuideType, result: &GateResult) -> SimpleGuideResult {
    SimpleGuideResult {
        stage,
        guide_type,
        message: result.feedback.clone(),
        progress: result.score,
        displayed_progress: result.score,
        is_resolved: false,
    }
}

fn move_type(direction: MoveDirection) -> GuideType {
    match direction {
        MoveDirection::Forward => GuideType::MoveForward,
        MoveDirection::Backward => GuideType::MoveBackward,
        MoveDirection::Left => GuideType::MoveLeft,
        MoveDirection::Right => GuideType::MoveRight,
    }
}

fn zoom_type(direction: ZoomDirection) -> GuideType {
    match direction {
        ZoomDirection::In => GuideType::ZoomIn,
        ZoomDirection::Out => GuideType::ZoomOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecoach_models::{
        FramingDirective, GateId, HorizontalDirective, PositionMode, StepSize, TiltDirective,
    };

    fn passing(gate: GateId) -> GateResult {
        GateResult::new(gate, 1.0, 0.8, "ok")
    }

    fn evaluation_with(failing: Vec<GateResult>) -> GateEvaluation {
        let mut results: Vec<GateResult> = GateId::ALL.iter().map(|&g| passing(g)).collect();
        results.extend(failing);
        GateEvaluation::assemble(results)
    }

    #[test]
    fn test_all_passing_is_perfect() {
        let guide = select_guide(&evaluation_with(vec![]));
        assert_eq!(guide.stage, GuideStage::Perfect);
        assert_eq!(guide.guide_type, GuideType::Perfect);
        assert_eq!(guide.message, PERFECT_MESSAGE);
    }

    #[test]
    fn test_idle_when_reference_missing() {
        let eval = evaluation_with(vec![GateResult::reference_missing(GateId::Framing, 0.9)]);
        assert_eq!(select_guide(&eval).stage, GuideStage::Idle);
    }

    #[test]
    fn test_aspect_ratio_comes_first() {
        let eval = evaluation_with(vec![
            GateResult::new(GateId::AspectRatio, 0.0, 1.0, "Switch the camera to 4:3"),
            GateResult::new(GateId::Framing, 0.2, 0.9, "Move back"),
        ]);
        let guide = select_guide(&eval);
        assert_eq!(guide.stage, GuideStage::AspectRatio);
        assert_eq!(guide.guide_type, GuideType::ChangeAspectRatio);
    }

    #[test]
    fn test_no_subject_asks_to_enter_frame() {
        let eval = evaluation_with(vec![GateResult::no_subject(
            GateId::Position,
            0.8,
            "Cannot recognize subject",
        )]);
        let guide = select_guide(&eval);
        assert_eq!(guide.stage, GuideStage::FrameEntry);
        assert_eq!(guide.guide_type, GuideType::EnterFrame);
    }

    #[test]
    fn test_framing_directive_maps_to_move() {
        let framing = GateResult::new(GateId::Framing, 0.2, 0.9, "Move two steps backward")
            .with_metadata(GateMetadata::Framing {
                raw: None,
                stable: None,
                reference: None,
                size_ratio: None,
                cropped: false,
                directive: Some(FramingDirective {
                    direction: MoveDirection::Backward,
                    step: StepSize::Two,
                }),
            });
        let guide = select_guide(&evaluation_with(vec![framing]));
        assert_eq!(guide.stage, GuideStage::ShotType);
        assert_eq!(guide.guide_type, GuideType::MoveBackward);
        assert!((guide.progress - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_position_prefers_horizontal() {
        let position = GateResult::new(GateId::Position, 0.3, 0.8, "Move left")
            .with_metadata(GateMetadata::Position {
                mode: PositionMode::Keypoints,
                horizontal: Some(HorizontalDirective {
                    direction: MoveDirection::Left,
                    step: StepSize::Half,
                    offset_percent: 15.0,
                }),
                vertical: Some(TiltDirective {
                    direction: TiltDirection::Up,
                    degrees: 5.0,
                }),
            });
        let guide = select_guide(&evaluation_with(vec![position]));
        assert_eq!(guide.guide_type, GuideType::MoveLeft);
    }

    #[test]
    fn test_distance_before_pose() {
        let lens = GateResult::new(GateId::LensDistance, 0.5, 0.8, "Zoom in to 2.0x")
            .with_metadata(GateMetadata::LensDistance {
                current_focal_mm: 26.0,
                reference_focal_mm: 52.0,
                current_distance_m: None,
                reference_distance_m: None,
                action: LensAction::Zoom {
                    direction: ZoomDirection::In,
                    target_zoom: 2.0,
                },
                estimated_reference: false,
            });
        let pose = GateResult::new(GateId::Pose, 0.0, 0.75, "Raise your left arm");
        let guide = select_guide(&evaluation_with(vec![lens, pose]));
        assert_eq!(guide.stage, GuideStage::DistanceZoom);
        assert_eq!(guide.guide_type, GuideType::ZoomIn);
    }

    #[test]
    fn test_pose_analyzing_is_waiting() {
        let pose = GateResult::analyzing(GateId::Pose, 0.75, "Analyzing pose…");
        let guide = select_guide(&evaluation_with(vec![pose]));
        assert_eq!(guide.stage, GuideStage::Pose);
        assert_eq!(guide.guide_type, GuideType::Waiting);
    }
}
