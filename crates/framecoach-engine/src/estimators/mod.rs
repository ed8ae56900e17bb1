//! Numeric estimators shared by the gates and the reference builder.

pub mod distance;
pub mod focal_length;
pub mod keypoint_smoother;
pub mod shot_classifier;
pub mod structure;

pub use distance::{estimate_distance_m, shoulder_pixel_width, REFERENCE_SENSOR_WIDTH_MM};
pub use focal_length::{FocalLengthResolver, LensAnchor, LensTable};
pub use keypoint_smoother::ShoulderSmoother;
pub use shot_classifier::classify_shot_type;
pub use structure::{BodyStructure, BodyTier};

// === Statistical helpers ===

/// Arithmetic mean; 0.0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Largest finite value, if any.
pub(crate) fn max_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        Some(m) if m >= v => Some(m),
        _ => Some(v),
    })
}

/// Smallest finite value, if any.
pub(crate) fn min_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        Some(m) if m <= v => Some(m),
        _ => Some(v),
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[1.0, 2.0, 3.0]) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_min_max_skip_non_finite() {
        let values = [0.4, f64::NAN, 0.9, 0.1];
        assert_eq!(max_of(values.iter().copied()), Some(0.9));
        assert_eq!(min_of(values.iter().copied()), Some(0.1));
        assert_eq!(max_of(std::iter::empty()), None);
    }
}
