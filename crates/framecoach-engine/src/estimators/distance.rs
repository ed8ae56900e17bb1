//! Pinhole-model subject distance estimation.

use framecoach_models::keypoint::index;
use framecoach_models::{ImageSize, Keypoints};

/// Sensor width of a 35mm-equivalent frame.
pub const REFERENCE_SENSOR_WIDTH_MM: f64 = 36.0;

/// Horizontal shoulder width in pixels, if both shoulders are confident.
pub fn shoulder_pixel_width(keypoints: &Keypoints, image: ImageSize, threshold: f64) -> Option<f64> {
    if image.is_degenerate() {
        return None;
    }
    let left = keypoints.confident(index::LEFT_SHOULDER, threshold)?;
    let right = keypoints.confident(index::RIGHT_SHOULDER, threshold)?;
    let width = (left.x - right.x).abs() * f64::from(image.width);
    (width > 0.0).then_some(width)
}

/// Estimate subject distance in meters.
///
/// `distance = real_width * focal / width_on_sensor`, where the width on the
/// sensor is the shoulder's share of the frame width times the reference
/// sensor width. Degenerate inputs yield `None`, never zero.
pub fn estimate_distance_m(
    shoulder_px: f64,
    image_width_px: f64,
    focal_length_mm: f64,
    real_width_m: f64,
) -> Option<f64> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !valid(shoulder_px) || !valid(image_width_px) || !valid(focal_length_mm) || !valid(real_width_m)
    {
        return None;
    }

    let sensor_on_subject_mm = (shoulder_px / image_width_px) * REFERENCE_SENSOR_WIDTH_MM;
    let distance = real_width_m * focal_length_mm / sensor_on_subject_mm;
    distance.is_finite().then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecoach_models::Keypoint;

    #[test]
    fn test_two_meter_round_trip() {
        // 0.40m * 24mm / 2.0m = 4.8mm on the sensor
        let image_width = 1080.0;
        let shoulder_px = 4.8 / REFERENCE_SENSOR_WIDTH_MM * image_width;

        let distance = estimate_distance_m(shoulder_px, image_width, 24.0, 0.40).unwrap();
        assert!(
            (distance - 2.0).abs() / 2.0 < 0.01,
            "Expected ~2.0m, got {}",
            distance
        );
    }

    #[test]
    fn test_degenerate_inputs_have_no_distance() {
        assert!(estimate_distance_m(0.0, 1080.0, 24.0, 0.4).is_none());
        assert!(estimate_distance_m(100.0, 0.0, 24.0, 0.4).is_none());
        assert!(estimate_distance_m(100.0, 1080.0, 0.0, 0.4).is_none());
        assert!(estimate_distance_m(f64::NAN, 1080.0, 24.0, 0.4).is_none());
    }

    #[test]
    fn test_shoulder_pixel_width() {
        let mut points = vec![Keypoint::missing(); 17];
        points[index::LEFT_SHOULDER] = Keypoint::new(0.4, 0.3, 0.9);
        points[index::RIGHT_SHOULDER] = Keypoint::new(0.6, 0.3, 0.9);
        let kps = Keypoints::new(points.clone());

        let width = shoulder_pixel_width(&kps, ImageSize::new(1000, 1500), 0.3).unwrap();
        assert!((width - 200.0).abs() < 1e-6);
        assert!(shoulder_pixel_width(&kps, ImageSize::new(0, 1500), 0.3).is_none());

        points[index::RIGHT_SHOULDER].confidence = 0.2;
        assert!(shoulder_pixel_width(&Keypoints::new(points), ImageSize::new(1000, 1500), 0.3).is_none());
    }
}
