//! Shot type definitions.
//!
//! A shot type is a discrete framing classification derived from which body
//! landmarks are visible. Levels are ordered by distance from the camera:
//! lower = closer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Framing classification with 8 ordered levels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ShotType {
    /// Face fills the frame.
    ExtremeCloseUp,
    /// Head and top of the shoulders.
    CloseUp,
    /// Head to chest.
    MediumCloseUp,
    /// Head to waist with arms in frame.
    MediumShot,
    /// Head to mid-thigh ("cowboy" shot).
    AmericanShot,
    /// Head to knees.
    MediumFullShot,
    /// Whole body.
    FullShot,
    /// Whole body, small in a wide frame.
    LongShot,
}

impl ShotType {
    /// All shot types, closest first.
    pub const ALL: &'static [ShotType] = &[
        ShotType::ExtremeCloseUp,
        ShotType::CloseUp,
        ShotType::MediumCloseUp,
        ShotType::MediumShot,
        ShotType::AmericanShot,
        ShotType::MediumFullShot,
        ShotType::FullShot,
        ShotType::LongShot,
    ];

    /// Ordinal level (0 = extreme close-up, 7 = long shot).
    pub fn level(&self) -> u8 {
        match self {
            ShotType::ExtremeCloseUp => 0,
            ShotType::CloseUp => 1,
            ShotType::MediumCloseUp => 2,
            ShotType::MediumShot => 3,
            ShotType::AmericanShot => 4,
            ShotType::MediumFullShot => 5,
            ShotType::FullShot => 6,
            ShotType::LongShot => 7,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.get(level as usize).copied()
    }

    /// Signed level difference `other - self`.
    pub fn level_delta(&self, other: ShotType) -> i32 {
        other.level() as i32 - self.level() as i32
    }

    /// Absolute level distance.
    pub fn level_distance(&self, other: ShotType) -> u32 {
        self.level_delta(other).unsigned_abs()
    }

    /// Returns the shot type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotType::ExtremeCloseUp => "extreme_close_up",
            ShotType::CloseUp => "close_up",
            ShotType::MediumCloseUp => "medium_close_up",
            ShotType::MediumShot => "medium_shot",
            ShotType::AmericanShot => "american_shot",
            ShotType::MediumFullShot => "medium_full_shot",
            ShotType::FullShot => "full_shot",
            ShotType::LongShot => "long_shot",
        }
    }

    /// Returns a human-readable name used in directives.
    pub fn display_name(&self) -> &'static str {
        match self {
            ShotType::ExtremeCloseUp => "extreme close-up",
            ShotType::CloseUp => "close-up",
            ShotType::MediumCloseUp => "medium close-up",
            ShotType::MediumShot => "medium shot",
            ShotType::AmericanShot => "american shot",
            ShotType::MediumFullShot => "medium full shot",
            ShotType::FullShot => "full shot",
            ShotType::LongShot => "long shot",
        }
    }
}

impl fmt::Display for ShotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShotType {
    type Err = ShotTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace(['-', ' '], "_");
        ShotType::ALL
            .iter()
            .find(|shot| shot.as_str() == normalized)
            .copied()
            .ok_or_else(|| ShotTypeParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown shot type: {0}")]
pub struct ShotTypeParseError(String);
