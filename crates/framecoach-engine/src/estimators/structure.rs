//! Compact body structure derived from a keypoint array.
//!
//! The structure is recomputed every frame and never stored. It is used by
//! the framing gate (vertical span) and the position gate (centroid and top
//! anchor).

use framecoach_models::keypoint::index;
use framecoach_models::{Keypoints, Point};
use serde::{Deserialize, Serialize};

use super::{max_of, mean, min_of};

/// Lowest body tier with a confident landmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyTier {
    Shoulder = 0,
    Hip = 1,
    Knee = 2,
    Ankle = 3,
}

/// Centroid, top anchor, vertical span and lowest visible tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyStructure {
    /// Mean of the confident shoulders and hips.
    pub centroid: Point,
    /// Top of the head, or the shoulder line when no head point is confident.
    pub top_anchor_y: f64,
    /// `bottom - top_anchor_y`, never negative.
    pub span_y: f64,
    pub lowest_tier: BodyTier,
}

impl BodyStructure {
    /// Extract the structure. `None` without a confident shoulder or when
    /// the landmarks are inverted.
    pub fn extract(keypoints: &Keypoints, threshold: f64) -> Option<Self> {
        let shoulders: Vec<_> = keypoints
            .confident_of(&index::SHOULDERS, threshold)
            .collect();
        if shoulders.is_empty() {
            return None;
        }

        let shoulder_line = min_of(shoulders.iter().map(|kp| kp.y))?;
        let top_anchor_y = min_of(keypoints.confident_of(&index::HEAD, threshold).map(|kp| kp.y))
            .unwrap_or(shoulder_line);

        let torso: Vec<_> = keypoints
            .confident_of(&index::SHOULDERS, threshold)
            .chain(keypoints.confident_of(&index::HIPS, threshold))
            .collect();
        let xs: Vec<f64> = torso.iter().map(|kp| kp.x).collect();
        let ys: Vec<f64> = torso.iter().map(|kp| kp.y).collect();
        let centroid = Point::new(mean(&xs), mean(&ys));

        let ankle_bottom = max_of(
            keypoints
                .confident_of(&index::ANKLES, threshold)
                .chain(keypoints.confident_in(index::FEET, threshold))
                .map(|kp| kp.y),
        );
        let knee_bottom = max_of(keypoints.confident_of(&index::KNEES, threshold).map(|kp| kp.y));
        let hip_bottom = max_of(keypoints.confident_of(&index::HIPS, threshold).map(|kp| kp.y));
        let shoulder_bottom = max_of(shoulders.iter().map(|kp| kp.y));

        let (lowest_tier, bottom_y) = if let Some(y) = ankle_bottom {
            (BodyTier::Ankle, y)
        } else if let Some(y) = knee_bottom {
            (BodyTier::Knee, y)
        } else if let Some(y) = hip_bottom {
            (BodyTier::Hip, y)
        } else {
            (BodyTier::Shoulder, shoulder_bottom?)
        };

        let span_y = bottom_y - top_anchor_y;
        if span_y < 0.0 || !span_y.is_finite() {
            return None;
        }

        Some(Self {
            centroid,
            top_anchor_y,
            span_y,
            lowest_tier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimators::fixtures::{cut_below, full_body};
    use framecoach_models::Keypoint;

    #[test]
    fn test_full_body_structure() {
        let kps = full_body(0.5, 0.1, 0.9);
        let s = BodyStructure::extract(&kps, 0.3).unwrap();

        assert_eq!(s.lowest_tier, BodyTier::Ankle);
        assert!((s.centroid.x - 0.5).abs() < 1e-9, "centroid x = {}", s.centroid.x);
        // Head top is the eyes at 2% of the body height.
        assert!((s.top_anchor_y - 0.116).abs() < 1e-9);
        assert!((s.span_y - (0.9 - 0.116)).abs() < 1e-9);
    }

    #[test]
    fn test_tier_follows_visible_landmarks() {
        let kps = full_body(0.5, 0.1, 0.9);
        let bust = cut_below(&kps, 0.6);
        let s = BodyStructure::extract(&bust, 0.3).unwrap();
        assert_eq!(s.lowest_tier, BodyTier::Hip);

        let knees = cut_below(&kps, 0.8);
        assert_eq!(
            BodyStructure::extract(&knees, 0.3).unwrap().lowest_tier,
            BodyTier::Knee
        );
    }

    #[test]
    fn test_top_anchor_falls_back_to_shoulders() {
        let mut points = full_body(0.5, 0.1, 0.9).0;
        for i in index::HEAD {
            points[i] = Keypoint::missing();
        }
        let s = BodyStructure::extract(&Keypoints::new(points), 0.3).unwrap();
        assert!((s.top_anchor_y - (0.1 + 0.8 * 0.18)).abs() < 1e-9);
    }

    #[test]
    fn test_absent_without_shoulders() {
        let mut points = full_body(0.5, 0.1, 0.9).0;
        points[index::LEFT_SHOULDER] = Keypoint::missing();
        points[index::RIGHT_SHOULDER] = Keypoint::new(0.5, 0.3, 0.1);
        assert!(BodyStructure::extract(&Keypoints::new(points), 0.3).is_none());
        assert!(BodyStructure::extract(&Keypoints::default(), 0.3).is_none());
    }

    #[test]
    fn test_absent_when_inverted() {
        let mut points = full_body(0.5, 0.1, 0.9).0;
        // Head below the lowest tier.
        for i in index::HEAD {
            points[i] = Keypoint::new(0.5, 0.95, 0.9);
        }
        assert!(BodyStructure::extract(&Keypoints::new(points), 0.3).is_none());
    }
}
