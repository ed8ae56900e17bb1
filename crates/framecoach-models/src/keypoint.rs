//! Pose keypoints in normalized image coordinates.
//!
//! Keypoints follow the COCO-WholeBody index layout. The first 17 entries are
//! the classic COCO body set; richer pose models append feet, face and hand
//! landmarks. Index meaning is fixed and never reordered.

use std::ops::RangeInclusive;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Confidence below which a keypoint is treated as not visible.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.3;

/// Fixed semantic keypoint indices.
pub mod index {
    use std::ops::RangeInclusive;

    pub const NOSE: usize = 0;
    pub const LEFT_EYE: usize = 1;
    pub const RIGHT_EYE: usize = 2;
    pub const LEFT_EAR: usize = 3;
    pub const RIGHT_EAR: usize = 4;
    pub const LEFT_SHOULDER: usize = 5;
    pub const RIGHT_SHOULDER: usize = 6;
    pub const LEFT_ELBOW: usize = 7;
    pub const RIGHT_ELBOW: usize = 8;
    pub const LEFT_WRIST: usize = 9;
    pub const RIGHT_WRIST: usize = 10;
    pub const LEFT_HIP: usize = 11;
    pub const RIGHT_HIP: usize = 12;
    pub const LEFT_KNEE: usize = 13;
    pub const RIGHT_KNEE: usize = 14;
    pub const LEFT_ANKLE: usize = 15;
    pub const RIGHT_ANKLE: usize = 16;

    /// Head points of the body set (nose, eyes, ears).
    pub const HEAD: [usize; 5] = [NOSE, LEFT_EYE, RIGHT_EYE, LEFT_EAR, RIGHT_EAR];
    pub const SHOULDERS: [usize; 2] = [LEFT_SHOULDER, RIGHT_SHOULDER];
    pub const ELBOWS: [usize; 2] = [LEFT_ELBOW, RIGHT_ELBOW];
    pub const HIPS: [usize; 2] = [LEFT_HIP, RIGHT_HIP];
    pub const KNEES: [usize; 2] = [LEFT_KNEE, RIGHT_KNEE];
    pub const ANKLES: [usize; 2] = [LEFT_ANKLE, RIGHT_ANKLE];

    /// Extended foot landmarks (big toe, small toe, heel per side).
    pub const FEET: RangeInclusive<usize> = 17..=22;
    /// 68-point face landmarks.
    pub const FACE: RangeInclusive<usize> = 23..=90;
    pub const LEFT_HAND: RangeInclusive<usize> = 91..=111;
    pub const RIGHT_HAND: RangeInclusive<usize> = 112..=132;
}

/// Number of keypoints in the minimal COCO body set.
pub const COCO_BODY_COUNT: usize = 17;

/// Number of keypoints in the COCO-WholeBody layout.
pub const WHOLE_BODY_COUNT: usize = 133;

/// A normalized point (0.0 = left/top, 1.0 = right/bottom).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in normalized units.
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A single detected landmark.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Keypoint {
    /// Normalized X coordinate
    pub x: f64,
    /// Normalized Y coordinate
    pub y: f64,
    /// Detector confidence (0.0-1.0)
    pub confidence: f64,
}

impl Keypoint {
    pub const fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    /// An undetected placeholder (zero confidence).
    pub const fn missing() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            confidence: 0.0,
        }
    }

    pub fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether this keypoint is confident enough to be used.
    pub fn is_confident(&self, threshold: f64) -> bool {
        self.confidence >= threshold && self.x.is_finite() && self.y.is_finite()
    }
}

/// Ordered keypoint array for one subject.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Keypoints(pub Vec<Keypoint>);

impl Keypoints {
    pub fn new(points: Vec<Keypoint>) -> Self {
        Self(points)
    }

    /// Build from parallel location and confidence arrays, as produced by
    /// most pose models. Extra entries in the longer array are ignored.
    pub fn from_parts(locations: &[(f64, f64)], confidences: &[f64]) -> Self {
        Self(
            locations
                .iter()
                .zip(confidences.iter())
                .map(|(&(x, y), &c)| Keypoint::new(x, y, c))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Keypoint] {
        &self.0
    }

    pub fn get(&self, idx: usize) -> Option<&Keypoint> {
        self.0.get(idx)
    }

    /// The keypoint at `idx` if present and confident.
    pub fn confident(&self, idx: usize, threshold: f64) -> Option<&Keypoint> {
        self.0.get(idx).filter(|kp| kp.is_confident(threshold))
    }

    /// Confident keypoints among the given indices.
    pub fn confident_of<'a>(
        &'a self,
        indices: &'a [usize],
        threshold: f64,
    ) -> impl Iterator<Item = &'a Keypoint> + 'a {
        indices
            .iter()
            .filter_map(move |&i| self.confident(i, threshold))
    }

    /// Confident keypoints within an index range (extended landmarks).
    pub fn confident_in(
        &self,
        range: RangeInclusive<usize>,
        threshold: f64,
    ) -> impl Iterator<Item = &Keypoint> + '_ {
        range.filter_map(move |i| self.confident(i, threshold))
    }

    /// Total number of confident keypoints.
    pub fn confident_count(&self, threshold: f64) -> usize {
        self.0.iter().filter(|kp| kp.is_confident(threshold)).count()
    }

    /// Whether the array covers at least the COCO body set.
    pub fn has_body_set(&self) -> bool {
        self.0.len() >= COCO_BODY_COUNT
    }

    /// Whether extended whole-body landmarks are present.
    pub fn has_whole_body(&self) -> bool {
        self.0.len() >= WHOLE_BODY_COUNT
    }
}

impl From<Vec<Keypoint>> for Keypoints {
    fn from(points: Vec<Keypoint>) -> Self {
        Self(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_zips_arrays() {
        let kps = Keypoints::from_parts(&[(0.1, 0.2), (0.3, 0.4)], &[0.9, 0.1, 0.5]);
        assert_eq!(kps.len(), 2);
        assert_eq!(kps.get(1), Some(&Keypoint::new(0.3, 0.4, 0.1)));
    }

    #[test]
    fn test_confident_filters_threshold() {
        let kps = Keypoints::new(vec![
            Keypoint::new(0.5, 0.1, 0.9),
            Keypoint::new(0.5, 0.2, 0.2),
        ]);
        assert!(kps.confident(0, DEFAULT_CONFIDENCE_THRESHOLD).is_some());
        assert!(kps.confident(1, DEFAULT_CONFIDENCE_THRESHOLD).is_none());
        assert!(kps.confident(7, DEFAULT_CONFIDENCE_THRESHOLD).is_none());
        assert_eq!(kps.confident_count(DEFAULT_CONFIDENCE_THRESHOLD), 1);
    }

    #[test]
    fn test_non_finite_is_not_confident() {
        let kp = Keypoint::new(f64::NAN, 0.5, 1.0);
        assert!(!kp.is_confident(0.3));
    }

    #[test]
    fn test_serde_transparent() {
        let kps = Keypoints::new(vec![Keypoint::new(0.25, 0.5, 1.0)]);
        let json = serde_json::to_string(&kps).unwrap();
        assert!(json.starts_with('['));
        let back: Keypoints = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kps);
    }
}
