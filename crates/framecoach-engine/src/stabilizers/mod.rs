//! Temporal stabilizers layered on top of the raw gate results.

pub mod active_feedback;
pub mod adaptive_difficulty;
pub mod debouncer;
pub mod guide_hysteresis;
pub mod shot_hysteresis;
pub mod temporal_lock;

pub use active_feedback::ActiveFeedback;
pub use adaptive_difficulty::{relax_threshold, relax_tolerance, AdaptiveDifficulty};
pub use debouncer::{DebounceInput, DebounceOutcome, GuidanceDebouncer};
pub use guide_hysteresis::GuideHysteresis;
pub use shot_hysteresis::ShotTypeHysteresis;
pub use temporal_lock::TemporalLock;
