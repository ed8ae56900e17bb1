//! Shot type classification from visible body landmarks.
//!
//! The lowest visible body part decides the shot type. When keypoints are
//! unusable the bounding box height is bucketed instead.

use framecoach_models::keypoint::index;
use framecoach_models::{Keypoint, Keypoints, NormalizedRect, ShotType};
use tracing::trace;

use super::{max_of, min_of};

/// Confident face landmarks needed to call a shoulder-level frame a close-up.
const CLOSE_UP_FACE_LANDMARKS: usize = 50;

/// Head-to-ankle span below which a full body counts as a long shot.
const LONG_SHOT_MAX_SPAN: f64 = 0.3;

/// Bbox height buckets, tallest first.
const BBOX_HEIGHT_BUCKETS: [(f64, ShotType); 6] = [
    (0.9, ShotType::CloseUp),
    (0.75, ShotType::MediumCloseUp),
    (0.6, ShotType::MediumShot),
    (0.45, ShotType::AmericanShot),
    (0.3, ShotType::MediumFullShot),
    (0.15, ShotType::FullShot),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Face,
    Shoulder,
    Elbow,
    Hip,
    Knee,
    Ankle,
}

/// Classify the shot type.
///
/// Pure: identical input always yields identical output. `None` means the
/// subject could not be classified at all.
pub fn classify_shot_type(
    keypoints: &Keypoints,
    bbox: Option<&NormalizedRect>,
    threshold: f64,
) -> Option<ShotType> {
    if keypoints.has_body_set() {
        if let Some(shot) = classify_keypoints(keypoints, threshold) {
            return Some(shot);
        }
    }

    let shot = bbox.and_then(classify_bbox);
    trace!(?shot, "Shot type from bbox fallback");
    shot
}

fn classify_keypoints(keypoints: &Keypoints, threshold: f64) -> Option<ShotType> {
    let face_points = || {
        keypoints
            .confident_of(&index::HEAD, threshold)
            .chain(keypoints.confident_in(index::FACE, threshold))
    };

    let parts = [
        (Part::Face, lowest(face_points())),
        (
            Part::Shoulder,
            lowest(keypoints.confident_of(&index::SHOULDERS, threshold)),
        ),
        (
            Part::Elbow,
            lowest(keypoints.confident_of(&index::ELBOWS, threshold)),
        ),
        (
            Part::Hip,
            lowest(keypoints.confident_of(&index::HIPS, threshold)),
        ),
        (
            Part::Knee,
            lowest(keypoints.confident_of(&index::KNEES, threshold)),
        ),
        (
            Part::Ankle,
            lowest(
                keypoints
                    .confident_of(&index::ANKLES, threshold)
                    .chain(keypoints.confident_in(index::FEET, threshold)),
            ),
        ),
    ];

    // Later (lower) parts win ties.
    let (part, lowest_y) = parts
        .iter()
        .filter_map(|(part, y)| y.map(|y| (*part, y)))
        .fold(None, |best: Option<(Part, f64)>, (part, y)| match best {
            Some((_, best_y)) if best_y > y => best,
            _ => Some((part, y)),
        })?;

    let shot = match part {
        Part::Face => ShotType::ExtremeCloseUp,
        Part::Shoulder => {
            let face_landmarks = keypoints.confident_in(index::FACE, threshold).count();
            if face_landmarks > CLOSE_UP_FACE_LANDMARKS {
                ShotType::CloseUp
            } else {
                ShotType::MediumCloseUp
            }
        }
        Part::Elbow => ShotType::MediumCloseUp,
        Part::Hip => {
            if keypoints.confident_of(&index::ELBOWS, threshold).next().is_some() {
                ShotType::MediumShot
            } else {
                ShotType::AmericanShot
            }
        }
        Part::Knee => ShotType::MediumFullShot,
        Part::Ankle => {
            let top = min_of(face_points().map(|kp| kp.y))
                .or_else(|| {
                    min_of(
                        keypoints
                            .confident_of(&index::SHOULDERS, threshold)
                            .map(|kp| kp.y),
                    )
                })
                .unwrap_or(0.0);
            if lowest_y - top < LONG_SHOT_MAX_SPAN {
                ShotType::LongShot
            } else {
                ShotType::FullShot
            }
        }
    };

    trace!(?part, lowest_y, %shot, "Shot type from keypoints");
    Some(shot)
}

fn lowest<'a>(points: impl Iterator<Item = &'a Keypoint>) -> Option<f64> {
    max_of(points.map(|kp| kp.y))
}

fn classify_bbox(bbox: &NormalizedRect) -> Option<ShotType> {
    if bbox.area() <= 0.0 || !bbox.height.is_finite() {
        return None;
    }
    let shot = BBOX_HEIGHT_BUCKETS
        .iter()
        .find(|(min_height, _)| bbox.height >= *min_height)
        .map(|(_, shot)| *shot)
        .unwrap_or(ShotType::LongShot);
    Some(shot)
}
