//! Per-frame live inputs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::directive::BodyPart;
use crate::keypoint::Keypoints;
use crate::rect::{ImageSize, NormalizedRect};

/// Angle difference of one body-part group against the reference pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PartDifference {
    pub part: BodyPart,
    /// Absolute angle difference in degrees.
    pub angle_diff_deg: f64,
    /// Precomputed natural-language hint, e.g. "Raise your left arm a little".
    #[serde(default)]
    pub hint: Option<String>,
}

/// Externally computed pose-similarity comparison.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PoseComparison {
    pub parts: Vec<PartDifference>,
}

/// Snapshot of one analyzed camera frame. Treated as immutable input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LiveMetrics {
    /// Capture wall-clock time in seconds.
    pub timestamp: f64,
    pub keypoints: Keypoints,
    #[serde(default)]
    pub bbox: Option<NormalizedRect>,
    pub image_size: ImageSize,
    #[serde(default)]
    pub compression_index: Option<f64>,
    #[serde(default)]
    pub is_front_camera: bool,
    #[serde(default)]
    pub pose_comparison: Option<PoseComparison>,
}

impl LiveMetrics {
    /// A frame with only keypoints and image dimensions.
    pub fn new(timestamp: f64, keypoints: Keypoints, image_size: ImageSize) -> Self {
        Self {
            timestamp,
            keypoints,
            bbox: None,
            image_size,
            compression_index: None,
            is_front_camera: false,
            pose_comparison: None,
        }
    }

    pub fn with_bbox(mut self, bbox: NormalizedRect) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn with_front_camera(mut self, front: bool) -> Self {
        self.is_front_camera = front;
        self
    }

    pub fn with_pose_comparison(mut self, comparison: PoseComparison) -> Self {
        self.pose_comparison = Some(comparison);
        self
    }

    /// Bounding-box area as a fraction of the frame (0 when absent).
    pub fn bbox_area(&self) -> f64 {
        self.bbox.map(|b| b.area()).unwrap_or(0.0)
    }
}

/// Body build used to assume a real shoulder width for distance estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    #[default]
    Average,
    Broad,
    Narrow,
    Child,
}

impl BodyType {
    /// Assumed biacromial shoulder width in meters.
    pub fn shoulder_width_m(&self) -> f64 {
        match self {
            BodyType::Average => 0.40,
            BodyType::Broad => 0.45,
            BodyType::Narrow => 0.36,
            BodyType::Child => 0.30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyType::Average => "average",
            BodyType::Broad => "broad",
            BodyType::Narrow => "narrow",
            BodyType::Child => "child",
        }
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BodyType {
    type Err = BodyTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "average" => Ok(BodyType::Average),
            "broad" => Ok(BodyType::Broad),
            "narrow" => Ok(BodyType::Narrow),
            "child" => Ok(BodyType::Child),
            _ => Err(BodyTypeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown body type: {0}")]
pub struct BodyTypeParseError(String);

/// Per-frame settings shared by all gates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GateSettings {
    /// Adaptive difficulty multiplier (1.0 = baseline).
    pub difficulty_multiplier: f64,
    /// Current camera zoom factor (display zoom, e.g. 1.0, 2.0).
    pub current_zoom_factor: f64,
    pub body_type: BodyType,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            difficulty_multiplier: 1.0,
            current_zoom_factor: 1.0,
            body_type: BodyType::Average,
        }
    }
}
