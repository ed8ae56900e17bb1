//! Configuration for the gate engine.
//!
//! Centralizes every tunable threshold, tolerance and time window so the
//! gates and stabilizers carry no magic numbers of their own.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EngineError, EngineResult};

/// Engine configuration.
///
/// All durations are in seconds of frame wall-clock time, never frame counts,
/// so behavior is stable under variable frame rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // ============================================
    // Gate thresholds
    // ============================================
    /// Pass threshold for the framing gate.
    pub framing_threshold: f64,

    /// Pass threshold for the position gate.
    pub position_threshold: f64,

    /// Pass threshold for the lens/distance gate.
    pub lens_threshold: f64,

    /// Pass threshold for the pose gate.
    pub pose_threshold: f64,

    /// Floor applied when adaptive difficulty relaxes thresholds.
    pub min_relaxed_threshold: f64,

    // ============================================
    // Keypoints / subject detection
    // ============================================
    /// Minimum keypoint confidence.
    pub confidence_threshold: f64,

    /// Below this many confident keypoints (and a negligible bbox) there is no subject.
    pub no_subject_min_keypoints: usize,

    /// Bbox area (fraction of frame) below which the bbox is negligible.
    pub no_subject_min_bbox_area: f64,

    // ============================================
    // Framing
    // ============================================
    /// Accepted size ratio band (reference / current) when shot types match.
    pub framing_size_band: f64,

    /// Score lost per shot-type level of difference.
    pub framing_level_penalty: f64,

    /// Score reported when shot types match but size is outside the band.
    pub framing_out_of_band_score: f64,

    /// Margin (fraction of frame) within which a bbox "touches" an edge.
    pub framing_edge_margin: f64,

    /// Score cap when the subject is cropped by the frame edges.
    pub framing_cropped_score_cap: f64,

    // ============================================
    // Position
    // ============================================
    /// Offset (fraction of frame) beyond which position feedback is given.
    pub position_offset_threshold: f64,

    /// Offset at which the position score reaches zero.
    pub position_score_falloff: f64,

    // ============================================
    // Lens / distance
    // ============================================
    /// Camera model used to pick the lens table.
    pub device_model: String,

    /// Focal length tolerance in mm for EXIF references.
    pub focal_tolerance_mm: f64,

    /// Focal length tolerance in mm for depth-estimated references.
    pub estimated_focal_tolerance_mm: f64,

    /// Distance tolerance in meters.
    pub distance_tolerance_m: f64,

    /// Weight of the focal accuracy term (the distance term gets the rest).
    pub focal_weight: f64,

    /// EMA factor for shoulder keypoint smoothing.
    pub shoulder_ema_alpha: f64,

    /// Maximum confidence weight applied to the EMA factor.
    pub shoulder_max_confidence_weight: f64,

    // ============================================
    // Pose
    // ============================================
    /// Angle tolerance in degrees.
    pub pose_angle_tolerance_deg: f64,

    /// Maximum number of violating parts reported.
    pub pose_max_violations: usize,

    // ============================================
    // Stabilizers
    // ============================================
    /// Identical raw shot types required before the stable value changes.
    pub shot_hysteresis_frames: u32,

    /// Identical raw guide decisions required before the emitted guide changes.
    pub guide_hysteresis_frames: u32,

    /// Force a guide change after this long without one.
    pub guide_force_unstick_secs: f64,

    /// Minimum interval between debounced feedback updates.
    pub debounce_min_interval_secs: f64,

    /// Relative distance change treated as significant.
    pub debounce_distance_change: f64,

    /// Absolute focal change (mm) treated as significant.
    pub debounce_focal_change_mm: f64,

    /// Repeats of an unchanged message before a periodic refresh.
    pub debounce_refresh_repeats: u32,

    /// Minimum span of those repeats.
    pub debounce_refresh_secs: f64,

    /// Hold-still duration before the lock engages.
    pub lock_duration_secs: f64,

    /// Time stuck on one failing message before difficulty relaxes.
    pub frustration_window_secs: f64,

    /// Difficulty multiplier increase per frustration episode.
    pub difficulty_step: f64,

    /// Upper bound for the difficulty multiplier.
    pub max_difficulty: f64,

    /// Progress samples kept per active feedback.
    pub feedback_history_len: usize,

    /// Minimum time a feedback stays on screen before another replaces it.
    pub feedback_min_display_secs: f64,

    /// How long a resolved feedback remains visible.
    pub feedback_resolved_display_secs: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Gate thresholds
            framing_threshold: 0.9,
            position_threshold: 0.8,
            lens_threshold: 0.8,
            pose_threshold: 0.75,
            min_relaxed_threshold: 0.5,

            // Keypoints
            confidence_threshold: 0.3,
            no_subject_min_keypoints: 5,
            no_subject_min_bbox_area: 0.01,

            // Framing
            framing_size_band: 1.3,
            framing_level_penalty: 0.2,
            framing_out_of_band_score: 0.6,
            framing_edge_margin: 0.02,
            framing_cropped_score_cap: 0.5,

            // Position
            position_offset_threshold: 0.05,
            position_score_falloff: 0.25,

            // Lens / distance
            device_model: "generic".to_string(),
            focal_tolerance_mm: 10.0,
            estimated_focal_tolerance_mm: 30.0,
            distance_tolerance_m: 0.3,
            focal_weight: 0.6,
            shoulder_ema_alpha: 0.3,
            shoulder_max_confidence_weight: 1.5,

            // Pose
            pose_angle_tolerance_deg: 15.0,
            pose_max_violations: 2,

            // Stabilizers
            shot_hysteresis_frames: 3,
            guide_hysteresis_frames: 2,
            guide_force_unstick_secs: 1.0,
            debounce_min_interval_secs: 0.5,
            debounce_distance_change: 0.25,
            debounce_focal_change_mm: 5.0,
            debounce_refresh_repeats: 5,
            debounce_refresh_secs: 2.0,
            lock_duration_secs: 0.5,
            frustration_window_secs: 5.0,
            difficulty_step: 0.25,
            max_difficulty: 2.0,
            feedback_history_len: 5,
            feedback_min_display_secs: 0.8,
            feedback_resolved_display_secs: 1.0,
        }
    }
}

impl EngineConfig {
    /// Looser matching for casual shooting.
    pub fn relaxed() -> Self {
        Self {
            framing_threshold: 0.8,
            position_threshold: 0.7,
            lens_threshold: 0.7,
            pose_threshold: 0.6,
            pose_angle_tolerance_deg: 20.0,
            frustration_window_secs: 4.0,
            ..Default::default()
        }
    }

    /// Tighter matching for recreating a shot precisely.
    pub fn strict() -> Self {
        Self {
            position_offset_threshold: 0.03,
            focal_tolerance_mm: 6.0,
            distance_tolerance_m: 0.2,
            pose_angle_tolerance_deg: 10.0,
            lock_duration_secs: 1.0,
            max_difficulty: 1.5,
            ..Default::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EngineError::ConfigNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check value ranges.
    pub fn validate(&self) -> EngineResult<()> {
        let unit = [
            ("framing_threshold", self.framing_threshold),
            ("position_threshold", self.position_threshold),
            ("lens_threshold", self.lens_threshold),
            ("pose_threshold", self.pose_threshold),
            ("min_relaxed_threshold", self.min_relaxed_threshold),
            ("confidence_threshold", self.confidence_threshold),
            ("framing_out_of_band_score", self.framing_out_of_band_score),
            ("framing_cropped_score_cap", self.framing_cropped_score_cap),
            ("focal_weight", self.focal_weight),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::invalid_config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        let positive = [
            ("framing_size_band", self.framing_size_band - 1.0),
            ("position_offset_threshold", self.position_offset_threshold),
            ("position_score_falloff", self.position_score_falloff),
            ("focal_tolerance_mm", self.focal_tolerance_mm),
            ("estimated_focal_tolerance_mm", self.estimated_focal_tolerance_mm),
            ("distance_tolerance_m", self.distance_tolerance_m),
            ("shoulder_ema_alpha", self.shoulder_ema_alpha),
            ("pose_angle_tolerance_deg", self.pose_angle_tolerance_deg),
            ("lock_duration_secs", self.lock_duration_secs),
            ("frustration_window_secs", self.frustration_window_secs),
        ];
        for (name, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(EngineError::invalid_config(format!(
                    "{} is out of range",
                    name
                )));
            }
        }

        if self.shoulder_ema_alpha > 1.0 {
            return Err(EngineError::invalid_config(
                "shoulder_ema_alpha must be at most 1.0",
            ));
        }
        if self.max_difficulty < 1.0 {
            return Err(EngineError::invalid_config(
                "max_difficulty must be at least 1.0",
            ));
        }
        if self.shot_hysteresis_frames == 0 || self.guide_hysteresis_frames == 0 {
            return Err(EngineError::invalid_config(
                "hysteresis frame counts must be at least 1",
            ));
        }
        if self.feedback_history_len == 0 {
            return Err(EngineError::invalid_config(
                "feedback_history_len must be at least 1",
            ));
        }
        Ok(())
    }

    /// Builder: Set the device model used for lens tables.
    pub fn with_device_model(mut self, model: impl Into<String>) -> Self {
        self.device_model = model.into();
        self
    }

    /// Builder: Set the temporal lock duration.
    pub fn with_lock_duration(mut self, secs: f64) -> Self {
        self.lock_duration_secs = secs;
        self
    }

    /// Builder: Set the pose angle tolerance.
    pub fn with_pose_tolerance(mut self, degrees: f64) -> Self {
        self.pose_angle_tolerance_deg = degrees;
        self
    }

    /// Builder: Set focal and distance tolerances.
    pub fn with_lens_tolerances(mut self, focal_mm: f64, distance_m: f64) -> Self {
        self.focal_tolerance_mm = focal_mm;
        self.distance_tolerance_m = distance_m;
        self
    }

    /// Builder: Set the debounce minimum interval.
    pub fn with_debounce_interval(mut self, secs: f64) -> Self {
        self.debounce_min_interval_secs = secs;
        self
    }
}
