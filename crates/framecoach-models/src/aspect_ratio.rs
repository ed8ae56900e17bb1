//! Camera aspect ratio classification.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::rect::ImageSize;

/// Capture aspect ratios offered by phone cameras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum CameraAspectRatio {
    #[serde(rename = "16:9")]
    Ratio16x9,
    #[serde(rename = "4:3")]
    Ratio4x3,
    #[serde(rename = "1:1")]
    Ratio1x1,
}

impl CameraAspectRatio {
    pub const ALL: &'static [CameraAspectRatio] = &[
        CameraAspectRatio::Ratio16x9,
        CameraAspectRatio::Ratio4x3,
        CameraAspectRatio::Ratio1x1,
    ];

    /// Long side over short side.
    pub fn as_f64(&self) -> f64 {
        match self {
            CameraAspectRatio::Ratio16x9 => 16.0 / 9.0,
            CameraAspectRatio::Ratio4x3 => 4.0 / 3.0,
            CameraAspectRatio::Ratio1x1 => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraAspectRatio::Ratio16x9 => "16:9",
            CameraAspectRatio::Ratio4x3 => "4:3",
            CameraAspectRatio::Ratio1x1 => "1:1",
        }
    }

    /// Classify image dimensions by nearest ratio. Orientation is ignored,
    /// so a 1080x1920 portrait frame is 16:9.
    pub fn classify(size: ImageSize) -> Option<Self> {
        let ratio = size.long_short_ratio()?;
        Self::ALL.iter().copied().min_by(|a, b| {
            (a.as_f64() - ratio)
                .abs()
                .total_cmp(&(b.as_f64() - ratio).abs())
        })
    }
}

impl fmt::Display for CameraAspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CameraAspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" | "9:16" => Ok(CameraAspectRatio::Ratio16x9),
            "4:3" | "3:4" => Ok(CameraAspectRatio::Ratio4x3),
            "1:1" => Ok(CameraAspectRatio::Ratio1x1),
            other => Err(AspectRatioParseError(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unsupported aspect ratio: {0}, expected one of 16:9, 4:3, 1:1")]
pub struct AspectRatioParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_common_sizes() {
        assert_eq!(
            CameraAspectRatio::classify(ImageSize::new(1920, 1080)),
            Some(CameraAspectRatio::Ratio16x9)
        );
        assert_eq!(
            CameraAspectRatio::classify(ImageSize::new(3024, 4032)),
            Some(CameraAspectRatio::Ratio4x3)
        );
        assert_eq!(
            CameraAspectRatio::classify(ImageSize::new(3024, 3024)),
            Some(CameraAspectRatio::Ratio1x1)
        );
    }

    #[test]
    fn test_classify_nearest() {
        // 3:2 (1.5) is closer to 4:3 (1.333) than to 16:9 (1.778)
        assert_eq!(
            CameraAspectRatio::classify(ImageSize::new(3000, 2000)),
            Some(CameraAspectRatio::Ratio4x3)
        );
    }

    #[test]
    fn test_classify_degenerate() {
        assert_eq!(CameraAspectRatio::classify(ImageSize::new(0, 1080)), None);
    }

    #[test]
    fn test_parse_and_serde() {
        assert_eq!(
            "9:16".parse::<CameraAspectRatio>().unwrap(),
            CameraAspectRatio::Ratio16x9
        );
        assert!("3:2".parse::<CameraAspectRatio>().is_err());
        let json = serde_json::to_string(&CameraAspectRatio::Ratio4x3).unwrap();
        assert_eq!(json, "\"4:3\"");
    }
}
