//! Per-issue progress smoothing for the displayed guide.

use std::collections::VecDeque;

use framecoach_models::{GuideStage, GuideType, SimpleGuideResult};
use tracing::debug;

use crate::config::EngineConfig;
use crate::estimators::mean;

/// Easing factor applied to the displayed progress each frame.
const DISPLAY_EASING: f64 = 0.35;

#[derive(Debug, Clone)]
struct FeedbackEntry {
    stage: GuideStage,
    guide_type: GuideType,
    message: String,
    history: VecDeque<f64>,
    smoothed: f64,
    displayed: f64,
    shown_at: f64,
    resolved_at: Option<f64>,
}

impl FeedbackEntry {
    fn new(guide: &SimpleGuideResult, capacity: usize, now: f64) -> Self {
        let mut history = VecDeque::with_capacity(capacity);
        history.push_back(guide.progress);
        Self {
            stage: guide.stage,
            guide_type: guide.guide_type,
            message: guide.message.clone(),
            history,
            smoothed: guide.progress,
            displayed: guide.progress,
            shown_at: now,
            resolved_at: None,
        }
    }

    fn same_issue(&self, guide: &SimpleGuideResult) -> bool {
        self.stage == guide.stage && self.guide_type == guide.guide_type
    }

    fn to_result(&self) -> SimpleGuideResult {
        SimpleGuideResult {
            stage: self.stage,
            guide_type: self.guide_type,
            message: self.message.clone(),
            progress: self.smoothed,
            displayed_progress: self.displayed,
            is_resolved: self.resolved_at.is_some(),
        }
    }
}

/// The feedback currently on screen.
///
/// The same (stage, guide type) keeps one entry whose progress is averaged
/// over a short ring buffer. A different issue replaces it only after the
/// minimum display time; when the new issue belongs to a later stage the old
/// one is first shown as resolved for a short window.
#[derive(Debug, Clone)]
pub struct ActiveFeedback {
    history_len: usize,
    min_display_secs: f64,
    resolved_display_secs: f64,
    current: Option<FeedbackEntry>,
}

impl Default for ActiveFeedback {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ActiveFeedback {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            history_len: config.feedback_history_len.max(1),
            min_display_secs: config.feedback_min_display_secs,
            resolved_display_secs: config.feedback_resolved_display_secs,
            current: None,
        }
    }

    /// Feed the stabilized guide for this frame; returns what to display.
    pub fn update(&mut self, guide: &SimpleGuideResult, now: f64) -> SimpleGuideResult {
        if guide.stage == GuideStage::Idle {
            self.current = None;
            return guide.clone();
        }

        let Some(entry) = self.current.as_mut() else {
            return self.replace(guide, now);
        };

        if entry.same_issue(guide) {
            entry.resolved_at = None;
            entry.message = guide.message.clone();
            entry.history.push_back(guide.progress);
            while entry.history.len() > self.history_len {
                entry.history.pop_front();
            }
            let samples: Vec<f64> = entry.history.iter().copied().collect();
            entry.smoothed = mean(&samples);
            entry.displayed += (entry.smoothed - entry.displayed) * DISPLAY_EASING;
            return entry.to_result();
        }

        if let Some(resolved_at) = entry.resolved_at {
            if now - resolved_at >= self.resolved_display_secs {
                return self.replace(guide, now);
            }
            entry.displayed += (1.0 - entry.displayed) * DISPLAY_EASING;
            return entry.to_result();
        }

        if now - entry.shown_at < self.min_display_secs {
            return entry.to_result();
        }

        let progressed = guide.stage > entry.stage && entry.stage != GuideStage::Perfect;
        if progressed && guide.stage != GuideStage::Perfect {
            debug!(stage = entry.stage.as_str(), "Feedback resolved");
            entry.resolved_at = Some(now);
            entry.smoothed = 1.0;
            entry.displayed += (1.0 - entry.displayed) * DISPLAY_EASING;
            return entry.to_result();
        }

        self.replace(guide, now)
    }

    pub fn reset(&mut self) {
        self.current = None;
    }

    fn replace(&mut self, guide: &SimpleGuideResult, now: f64) -> SimpleGuideResult {
        let entry = FeedbackEntry::new(guide, self.history_len, now);
        let result = entry.to_result();
        self.current = Some(entry);
        result
    }
}
