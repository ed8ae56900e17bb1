//! Offline replay of recorded sessions.
//!
//! A recording is a JSON-lines file. Each line is one [`ReplayEvent`]; blank
//! lines and lines starting with `#` are skipped. Events are applied in file
//! order through a single evaluator, without any timing of their own: frame
//! timestamps drive every time window.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use framecoach_engine::UnifiedEvaluator;
use framecoach_models::{BodyType, EvaluationResult, LiveMetrics, ReferenceAnalysis};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};
use crate::logging::SessionLogger;
use crate::metrics;

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    Reference { analysis: ReferenceAnalysis },
    Frame { frame: LiveMetrics },
    Zoom { factor: f64 },
    BodyType { body_type: BodyType },
    ResetLock,
    ClearReference,
}

impl ReplayEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ReplayEvent::Reference { .. } => "reference",
            ReplayEvent::Frame { .. } => "frame",
            ReplayEvent::Zoom { .. } => "zoom",
            ReplayEvent::BodyType { .. } => "body_type",
            ReplayEvent::ResetLock => "reset_lock",
            ReplayEvent::ClearReference => "clear_reference",
        }
    }
}

/// Parse a JSON-lines recording.
pub fn parse_events<R: BufRead>(reader: R) -> SessionResult<Vec<ReplayEvent>> {
    let mut events = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(trimmed)
            .map_err(|e| SessionError::invalid_event(i + 1, e.to_string()))?;
        events.push(event);
    }
    Ok(events)
}

/// Counters reported at the end of a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub events: usize,
    pub frames: usize,
    pub perfect_frames: usize,
    pub locks: usize,
}

/// Drives recorded events through one evaluator.
#[derive(Debug)]
pub struct Replayer {
    evaluator: UnifiedEvaluator,
    logger: SessionLogger,
    summary: ReplaySummary,
}

impl Replayer {
    pub fn new(evaluator: UnifiedEvaluator) -> Self {
        Self {
            evaluator,
            logger: SessionLogger::new(Uuid::new_v4()),
            summary: ReplaySummary::default(),
        }
    }

    pub fn evaluator(&self) -> &UnifiedEvaluator {
        &self.evaluator
    }

    pub fn summary(&self) -> ReplaySummary {
        self.summary
    }

    /// Apply one event; frames yield their evaluation.
    pub fn apply(&mut self, event: ReplayEvent) -> SessionResult<Option<EvaluationResult>> {
        metrics::record_replay_event(event.kind());
        self.summary.events += 1;

        match event {
            ReplayEvent::Reference { analysis } => {
                self.evaluator.build_and_set_reference(&analysis)?;
                self.logger.log_reference("set");
            }
            ReplayEvent::Frame { frame } => {
                let result = self.evaluator.evaluate(&frame);
                self.summary.frames += 1;
                if result.is_perfect {
                    self.summary.perfect_frames += 1;
                }
                if result.stability.just_locked {
                    self.summary.locks += 1;
                }
                self.logger.log_result(&result);
                return Ok(Some(result));
            }
            ReplayEvent::Zoom { factor } => self.evaluator.set_zoom_factor(factor)?,
            ReplayEvent::BodyType { body_type } => self.evaluator.set_body_type(body_type),
            ReplayEvent::ResetLock => self.evaluator.reset_lock(),
            ReplayEvent::ClearReference => {
                self.evaluator.clear_reference();
                self.logger.log_reference("cleared");
            }
        }
        Ok(None)
    }

    /// Replay every event from `reader`, writing one JSON result per frame to `out`.
    pub fn run<R: BufRead, W: Write>(&mut self, reader: R, mut out: W) -> SessionResult<ReplaySummary> {
        for event in parse_events(reader)? {
            if let Some(result) = self.apply(event)? {
                serde_json::to_writer(&mut out, &result)?;
                out.write_all(b"\n")?;
            }
        }
        out.flush()?;
        info!(
            events = self.summary.events,
            frames = self.summary.frames,
            locks = self.summary.locks,
            "Replay finished"
        );
        Ok(self.summary)
    }
}

/// Replay a recording file and collect every frame result.
pub fn replay_file(
    path: impl AsRef<Path>,
    evaluator: UnifiedEvaluator,
) -> SessionResult<Vec<EvaluationResult>> {
    let file = File::open(path.as_ref())?;
    let mut replayer = Replayer::new(evaluator);
    let mut results = Vec::new();
    for event in parse_events(BufReader::new(file))? {
        if let Some(result) = replayer.apply(event)? {
            results.push(result);
        }
    }
    Ok(results)
}
