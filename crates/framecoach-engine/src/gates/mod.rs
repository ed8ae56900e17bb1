//! The five composition gates.
//!
//! Each gate compares one dimension of the live frame against the reference
//! baseline and produces a single [`GateResult`]. Gates never observe each
//! other; anything they share is computed once per frame by the orchestrator
//! and handed over in [`GateContext`].

pub mod aspect_ratio;
pub mod framing;
pub mod lens_distance;
pub mod pose;
pub mod position;

pub use aspect_ratio::AspectRatioGate;
pub use framing::FramingGate;
pub use lens_distance::{LensDistanceGate, LensDistanceState};
pub use pose::PoseGate;
pub use position::PositionGate;

use framecoach_models::{GateId, GateResult, GateSettings, LiveMetrics, ReferenceState};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::estimators::FocalLengthResolver;
use crate::orchestrator::FrameAnalysis;
use crate::stabilizers::{relax_threshold, relax_tolerance};

/// Immutable per-frame input shared by every gate.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    pub live: &'a LiveMetrics,
    pub reference: &'a ReferenceState,
    pub settings: &'a GateSettings,
    pub analysis: &'a FrameAnalysis,
    pub config: &'a EngineConfig,
    pub resolver: &'a FocalLengthResolver,
}

impl GateContext<'_> {
    /// Score threshold after difficulty relaxation.
    pub fn relaxed_threshold(&self, threshold: f64) -> f64 {
        relax_threshold(
            threshold,
            self.settings.difficulty_multiplier,
            self.config.min_relaxed_threshold,
        )
    }

    /// Tolerance after difficulty relaxation.
    pub fn relaxed_tolerance(&self, tolerance: f64) -> f64 {
        relax_tolerance(tolerance, self.settings.difficulty_multiplier)
    }

    /// The pass threshold a gate applies this frame.
    pub fn threshold_for(&self, gate: GateId) -> f64 {
        match gate {
            // Binary gate, never relaxed.
            GateId::AspectRatio => 1.0,
            GateId::Framing => self.relaxed_threshold(self.config.framing_threshold),
            GateId::Position => self.relaxed_threshold(self.config.position_threshold),
            GateId::LensDistance => self.relaxed_threshold(self.config.lens_threshold),
            GateId::Pose => self.relaxed_threshold(self.config.pose_threshold),
        }
    }
}

/// One composition check.
///
/// Pure gates use `State = ()`. Stateful gates get their state threaded in
/// explicitly so it is visible and resettable by the owner.
pub trait Gate {
    type State: Default;

    fn id(&self) -> GateId;

    fn evaluate(&self, ctx: &GateContext<'_>, state: &mut Self::State) -> EngineResult<GateResult>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Context construction for gate unit tests.

    use framecoach_models::{
        CameraAspectRatio, ImageSize, Keypoints, LiveMetrics, NormalizedRect, ReferenceData,
        ReferenceFocalLength, ReferenceState, ShotType,
    };

    use crate::config::EngineConfig;
    use crate::estimators::{classify_shot_type, BodyStructure, FocalLengthResolver};
    use crate::orchestrator::FrameAnalysis;

    pub const PORTRAIT: ImageSize = ImageSize::new(1080, 1440);

    pub fn reference(keypoints: Keypoints, bbox: Option<NormalizedRect>) -> ReferenceState {
        let shot_type = classify_shot_type(&keypoints, bbox.as_ref(), 0.3);
        ReferenceData {
            bbox,
            image_size: PORTRAIT,
            aspect_ratio: CameraAspectRatio::Ratio4x3,
            keypoints,
            shot_type,
            focal_length: ReferenceFocalLength::Exif { mm: 26.0 },
            zoom_factor: Some(1.0),
            shoulder_ratio: None,
            estimated_distance_m: None,
            compression_index: None,
        }
        .into()
    }

    /// Analysis as the orchestrator would produce it once the shot type is stable.
    pub fn settled_analysis(live: &LiveMetrics) -> FrameAnalysis {
        let config = EngineConfig::default();
        let shot: Option<ShotType> =
            classify_shot_type(&live.keypoints, live.bbox.as_ref(), config.confidence_threshold);
        FrameAnalysis {
            structure: BodyStructure::extract(&live.keypoints, config.confidence_threshold),
            raw_shot_type: shot,
            stable_shot_type: shot,
            no_subject: FrameAnalysis::is_no_subject(live, &config),
        }
    }

    pub fn resolver() -> FocalLengthResolver {
        FocalLengthResolver::default()
    }
}
