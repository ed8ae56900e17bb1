//! Reference baseline types.
//!
//! A [`ReferenceData`] snapshot is computed once per reference-photo analysis
//! and never partially mutated: a new reference replaces it wholesale.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aspect_ratio::CameraAspectRatio;
use crate::keypoint::Keypoints;
use crate::rect::{ImageSize, NormalizedRect};
use crate::shot_type::ShotType;

/// Where the reference focal length came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ReferenceFocalLength {
    /// 35mm-equivalent focal length read from EXIF.
    Exif { mm: f64 },
    /// Estimated from depth analysis; less reliable than EXIF.
    DepthEstimated { mm: f64, confidence: f64 },
}

impl ReferenceFocalLength {
    pub fn mm(&self) -> f64 {
        match self {
            ReferenceFocalLength::Exif { mm } => *mm,
            ReferenceFocalLength::DepthEstimated { mm, .. } => *mm,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, ReferenceFocalLength::DepthEstimated { .. })
    }
}

/// One-time analysis result of the reference photo, as delivered by the
/// external analysis collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceAnalysis {
    pub keypoints: Keypoints,
    pub bbox: Option<NormalizedRect>,
    pub image_size: ImageSize,
    /// Explicit ratio; derived from `image_size` when absent.
    #[serde(default)]
    pub aspect_ratio: Option<CameraAspectRatio>,
    pub focal_length: ReferenceFocalLength,
    #[serde(default)]
    pub zoom_factor: Option<f64>,
    #[serde(default)]
    pub compression_index: Option<f64>,
}

/// Immutable metrics of the reference photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceData {
    pub bbox: Option<NormalizedRect>,
    pub image_size: ImageSize,
    pub aspect_ratio: CameraAspectRatio,
    pub keypoints: Keypoints,
    pub shot_type: Option<ShotType>,
    pub focal_length: ReferenceFocalLength,
    pub zoom_factor: Option<f64>,
    /// Shoulder width as a fraction of image width.
    pub shoulder_ratio: Option<f64>,
    /// Pinhole-model subject distance in meters.
    pub estimated_distance_m: Option<f64>,
    pub compression_index: Option<f64>,
}

/// Whether a reference baseline is available.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "state", content = "reference", rename_all = "snake_case")]
pub enum ReferenceState {
    /// No reference set; the system is idle.
    #[default]
    Unset,
    Baseline(Box<ReferenceData>),
}

impl ReferenceState {
    pub fn is_set(&self) -> bool {
        matches!(self, ReferenceState::Baseline(_))
    }

    pub fn baseline(&self) -> Option<&ReferenceData> {
        match self {
            ReferenceState::Unset => None,
            ReferenceState::Baseline(data) => Some(data),
        }
    }
}

impl From<ReferenceData> for ReferenceState {
    fn from(data: ReferenceData) -> Self {
        ReferenceState::Baseline(Box::new(data))
    }
}
