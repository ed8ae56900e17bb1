//! Directive vocabulary shared by every gate.
//!
//! Framing, position and lens feedback all describe movement with the same
//! step-size buckets so the user hears one consistent vocabulary.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far the user should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepSize {
    Little,
    Half,
    One,
    Two,
}

impl StepSize {
    /// Bucket a relative deviation (0.0 = none) into a step size.
    pub fn from_fraction(fraction: f64) -> Self {
        let fraction = fraction.abs();
        if fraction < 0.15 {
            StepSize::Little
        } else if fraction < 0.35 {
            StepSize::Half
        } else if fraction < 0.6 {
            StepSize::One
        } else {
            StepSize::Two
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            StepSize::Little => "a little",
            StepSize::Half => "half a step",
            StepSize::One => "one step",
            StepSize::Two => "two steps",
        }
    }
}

impl fmt::Display for StepSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.phrase())
    }
}

/// Physical movement of the photographer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

impl MoveDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveDirection::Forward => "forward",
            MoveDirection::Backward => "backward",
            MoveDirection::Left => "left",
            MoveDirection::Right => "right",
        }
    }

    /// Mirror left/right (front camera previews are mirrored).
    pub fn mirrored(&self) -> Self {
        match self {
            MoveDirection::Left => MoveDirection::Right,
            MoveDirection::Right => MoveDirection::Left,
            other => *other,
        }
    }
}

impl fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Camera tilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TiltDirection {
    Up,
    Down,
}

impl TiltDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TiltDirection::Up => "up",
            TiltDirection::Down => "down",
        }
    }
}

impl fmt::Display for TiltDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Zoom change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ZoomDirection {
    In,
    Out,
}

/// Outcome of the lens/distance comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LensAction {
    /// Focal length and distance both within tolerance.
    Matched,
    /// Only the zoom is off.
    Zoom {
        direction: ZoomDirection,
        target_zoom: f64,
    },
    /// Only the distance is off.
    Step {
        direction: MoveDirection,
        meters: f64,
    },
    /// Both are off; the user is told to step and zoom together.
    StepAndZoom {
        step: MoveDirection,
        meters: f64,
        zoom: ZoomDirection,
        target_zoom: f64,
    },
}

impl LensAction {
    pub fn category(&self) -> &'static str {
        match self {
            LensAction::Matched => "matched",
            LensAction::Zoom { .. } => "zoom",
            LensAction::Step { .. } => "distance",
            LensAction::StepAndZoom { .. } => "distance_zoom",
        }
    }
}

/// Body-part groups compared by the pose gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    ShoulderTilt,
    Face,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
    LeftHand,
    RightHand,
}

impl BodyPart {
    /// Reporting priority, most noticeable first.
    pub const PRIORITY: &'static [BodyPart] = &[
        BodyPart::ShoulderTilt,
        BodyPart::Face,
        BodyPart::LeftArm,
        BodyPart::RightArm,
        BodyPart::LeftLeg,
        BodyPart::RightLeg,
        BodyPart::LeftHand,
        BodyPart::RightHand,
    ];

    pub fn priority(&self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|p| p == self)
            .unwrap_or(Self::PRIORITY.len())
    }

    /// Generic text used when no direction hint was computed upstream.
    pub fn fallback_hint(&self) -> &'static str {
        match self {
            BodyPart::ShoulderTilt => "Level your shoulders like the reference",
            BodyPart::Face => "Turn your face like the reference",
            BodyPart::LeftArm => "Adjust your left arm",
            BodyPart::RightArm => "Adjust your right arm",
            BodyPart::LeftLeg => "Adjust your left leg",
            BodyPart::RightLeg => "Adjust your right leg",
            BodyPart::LeftHand => "Adjust your left hand",
            BodyPart::RightHand => "Adjust your right hand",
        }
    }
}
