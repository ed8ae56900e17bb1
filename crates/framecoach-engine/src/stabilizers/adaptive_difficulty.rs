//! Difficulty relaxation when the user is stuck on one issue.

use framecoach_models::{GateCategory, GateEvaluation, GateId};
use tracing::info;

use crate::config::EngineConfig;
use crate::metrics;

/// Divide a score threshold by the multiplier, never below `floor`.
/// Thresholds already at or under the floor are left alone.
pub fn relax_threshold(threshold: f64, multiplier: f64, floor: f64) -> f64 {
    if threshold <= floor || multiplier <= 1.0 {
        return threshold;
    }
    (threshold / multiplier).max(floor)
}

/// Widen an angle/distance tolerance, half as aggressively as thresholds.
pub fn relax_tolerance(tolerance: f64, multiplier: f64) -> f64 {
    tolerance * (1.0 + (multiplier.max(1.0) - 1.0) / 2.0)
}

#[derive(Debug, Clone)]
struct StuckEpisode {
    gate: GateId,
    category: GateCategory,
    since: f64,
    bumped: bool,
}

/// Tracks how long the primary failing issue has persisted.
///
/// The multiplier is bumped once per stuck episode and drops back to 1.0
/// only when every gate passes.
#[derive(Debug, Clone)]
pub struct AdaptiveDifficulty {
    window_secs: f64,
    step: f64,
    max: f64,
    floor: f64,
    multiplier: f64,
    episode: Option<StuckEpisode>,
}

impl Default for AdaptiveDifficulty {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl AdaptiveDifficulty {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            window_secs: config.frustration_window_secs,
            step: config.difficulty_step,
            max: config.max_difficulty,
            floor: config.min_relaxed_threshold,
            multiplier: 1.0,
            episode: None,
        }
    }

    /// Observe a raw evaluation at `now`; returns true when the multiplier
    /// was bumped on this frame.
    pub fn update(&mut self, evaluation: &GateEvaluation, now: f64) -> bool {
        if evaluation.all_passed() {
            if self.multiplier > 1.0 {
                info!(multiplier = self.multiplier, "All gates passed, difficulty reset");
            }
            self.multiplier = 1.0;
            self.episode = None;
            metrics::set_difficulty_multiplier(self.multiplier);
            return false;
        }

        let Some(gate) = evaluation.current_failed_gate() else {
            return false;
        };
        let category = evaluation.get(gate).category;

        // Missing subject or reference is not the user's framing struggle.
        if matches!(
            category,
            GateCategory::Idle | GateCategory::NoSubject | GateCategory::Analyzing | GateCategory::Error
        ) {
            self.episode = None;
            return false;
        }

        let same_issue = matches!(
            &self.episode,
            Some(ep) if ep.gate == gate && ep.category == category
        );
        if !same_issue {
            self.episode = Some(StuckEpisode {
                gate,
                category,
                since: now,
                bumped: false,
            });
            return false;
        }
        let Some(episode) = self.episode.as_mut() else {
            return false;
        };

        if episode.bumped || now - episode.since < self.window_secs {
            return false;
        }

        episode.bumped = true;
        let previous = self.multiplier;
        self.multiplier = (self.multiplier + self.step).min(self.max);
        if self.multiplier <= previous {
            return false;
        }

        info!(
            gate = gate.as_str(),
            multiplier = self.multiplier,
            "Stuck on one issue, relaxing difficulty"
        );
        metrics::record_difficulty_bump();
        metrics::set_difficulty_multiplier(self.multiplier);
        true
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn relax_threshold(&self, threshold: f64) -> f64 {
        relax_threshold(threshold, self.multiplier, self.floor)
    }

    pub fn relax_tolerance(&self, tolerance: f64) -> f64 {
        relax_tolerance(tolerance, self.multiplier)
    }

    pub fn reset(&mut self) {
        self.multiplier = 1.0;
        self.episode = None;
    }
}
