//! EMA smoothing of the shoulder keypoints used for distance estimation.

use framecoach_models::keypoint::index;
use framecoach_models::{Keypoint, Keypoints, Point};

use crate::config::EngineConfig;

/// Confidence-weighted exponential moving average over the two shoulders.
///
/// Frames where either shoulder is at or below the confidence threshold are
/// skipped: the state is kept, but nothing is returned for that frame.
#[derive(Debug, Clone)]
pub struct ShoulderSmoother {
    alpha: f64,
    max_confidence_weight: f64,
    threshold: f64,
    left: Option<Point>,
    right: Option<Point>,
}

impl Default for ShoulderSmoother {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ShoulderSmoother {
    pub fn new(alpha: f64, max_confidence_weight: f64, threshold: f64) -> Self {
        Self {
            alpha,
            max_confidence_weight,
            threshold,
            left: None,
            right: None,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.shoulder_ema_alpha,
            config.shoulder_max_confidence_weight,
            config.confidence_threshold,
        )
    }

    /// Feed one frame; returns the smoothed (left, right) shoulders.
    pub fn update(&mut self, keypoints: &Keypoints) -> Option<(Point, Point)> {
        let left = keypoints.get(index::LEFT_SHOULDER).copied()?;
        let right = keypoints.get(index::RIGHT_SHOULDER).copied()?;
        if !self.usable(&left) || !self.usable(&right) {
            return None;
        }

        let left = self.blend(self.left, &left);
        let right = self.blend(self.right, &right);
        self.left = Some(left);
        self.right = Some(right);
        Some((left, right))
    }

    /// Smoothed horizontal shoulder width (normalized).
    pub fn shoulder_width(&self) -> Option<f64> {
        match (self.left, self.right) {
            (Some(l), Some(r)) => Some((l.x - r.x).abs()),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.left = None;
        self.right = None;
    }

    fn usable(&self, kp: &Keypoint) -> bool {
        kp.confidence > self.threshold && kp.x.is_finite() && kp.y.is_finite()
    }

    fn blend(&self, previous: Option<Point>, current: &Keypoint) -> Point {
        let Some(prev) = previous else {
            return current.location();
        };
        let weight = (0.5 + current.confidence).min(self.max_confidence_weight);
        let alpha = (self.alpha * weight).clamp(0.0, 1.0);
        Point::new(
            prev.x + alpha * (current.x - prev.x),
            prev.y + alpha * (current.y - prev.y),
        )
    }
}
