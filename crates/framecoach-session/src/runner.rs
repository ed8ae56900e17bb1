//! Async coaching session.
//!
//! One tokio task owns one [`UnifiedEvaluator`]. Frames arrive on a
//! single-slot `watch` channel, so a slow evaluation drops stale frames
//! instead of queueing them. Commands arrive on an `mpsc` channel and are
//! applied before the next frame. Results are published on a `watch`
//! channel that any number of consumers can read.

use chrono::{DateTime, Utc};
use framecoach_engine::UnifiedEvaluator;
use framecoach_models::{BodyType, EvaluationResult, LiveMetrics, ReferenceAnalysis};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::logging::SessionLogger;
use crate::metrics;

const COMMAND_BUFFER_SIZE: usize = 16;

/// One evaluation as published to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedResult {
    pub session_id: Uuid,
    /// Sequence number of the frame this result was computed from.
    pub frame_seq: u64,
    pub published_at: DateTime<Utc>,
    pub result: EvaluationResult,
}

type Reply = oneshot::Sender<SessionResult<()>>;

#[derive(Debug)]
enum SessionCommand {
    SetReference(Box<ReferenceAnalysis>, Reply),
    ClearReference(Reply),
    SetZoom(f64, Reply),
    SetBodyType(BodyType, Reply),
    ResetLock(Reply),
    Shutdown,
}

impl SessionCommand {
    fn name(&self) -> &'static str {
        match self {
            SessionCommand::SetReference(..) => "set_reference",
            SessionCommand::ClearReference(_) => "clear_reference",
            SessionCommand::SetZoom(..) => "set_zoom",
            SessionCommand::SetBodyType(..) => "set_body_type",
            SessionCommand::ResetLock(_) => "reset_lock",
            SessionCommand::Shutdown => "shutdown",
        }
    }
}

/// Frame slot contents: sequence number and frame.
type FrameSlot = Option<(u64, LiveMetrics)>;

/// Client side of a running session.
#[derive(Debug)]
pub struct SessionHandle {
    id: Uuid,
    next_seq: u64,
    frames: watch::Sender<FrameSlot>,
    commands: mpsc::Sender<SessionCommand>,
    results: watch::Receiver<Option<PublishedResult>>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Offer a frame. Replaces any frame the session has not picked up yet.
    pub fn submit_frame(&mut self, frame: LiveMetrics) -> SessionResult<u64> {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.frames
            .send(Some((seq, frame)))
            .map_err(|_| SessionError::closed(self.id))?;
        Ok(seq)
    }

    pub async fn set_reference(&self, analysis: ReferenceAnalysis) -> SessionResult<()> {
        self.request(|reply| SessionCommand::SetReference(Box::new(analysis), reply))
            .await
    }

    pub async fn clear_reference(&self) -> SessionResult<()> {
        self.request(SessionCommand::ClearReference).await
    }

    pub async fn set_zoom(&self, zoom: f64) -> SessionResult<()> {
        self.request(|reply| SessionCommand::SetZoom(zoom, reply)).await
    }

    pub async fn set_body_type(&self, body_type: BodyType) -> SessionResult<()> {
        self.request(|reply| SessionCommand::SetBodyType(body_type, reply))
            .await
    }

    pub async fn reset_lock(&self) -> SessionResult<()> {
        self.request(SessionCommand::ResetLock).await
    }

    /// Most recent published result.
    pub fn latest(&self) -> Option<PublishedResult> {
        self.results.borrow().clone()
    }

    /// A receiver that observes every publication from now on.
    pub fn subscribe(&self) -> watch::Receiver<Option<PublishedResult>> {
        self.results.clone()
    }

    /// Stop the session task and wait for it to finish.
    pub async fn shutdown(self) -> SessionResult<()> {
        // The task may already be gone; joining reports how it ended.
        let _ = self.commands.send(SessionCommand::Shutdown).await;
        self.task
            .await
            .map_err(|e| SessionError::TaskFailed(e.to_string()))
    }

    async fn request<F>(&self, build: F) -> SessionResult<()>
    where
        F: FnOnce(Reply) -> SessionCommand,
    {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| SessionError::closed(self.id))?;
        rx.await.map_err(|_| SessionError::closed(self.id))?
    }
}

/// Session task state.
pub struct CoachingSession {
    evaluator: UnifiedEvaluator,
    logger: SessionLogger,
    results: watch::Sender<Option<PublishedResult>>,
    last_seq: u64,
    frames_evaluated: u64,
}

impl CoachingSession {
    /// Spawn a session on the current tokio runtime.
    pub fn spawn(config: &SessionConfig) -> SessionResult<SessionHandle> {
        let evaluator = config.evaluator()?;
        Ok(Self::spawn_with(evaluator))
    }

    /// Spawn a session around an already configured evaluator.
    pub fn spawn_with(evaluator: UnifiedEvaluator) -> SessionHandle {
        let id = Uuid::new_v4();
        let (frame_tx, frame_rx) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let (result_tx, result_rx) = watch::channel(None);

        let logger = SessionLogger::new(id);
        logger.log_start(&evaluator.config().device_model);
        let span = logger.create_span();

        let session = Self {
            evaluator,
            logger,
            results: result_tx,
            last_seq: 0,
            frames_evaluated: 0,
        };
        let task = tokio::spawn(session.run(frame_rx, command_rx).instrument(span));
        metrics::record_session_started();

        SessionHandle {
            id,
            next_seq: 0,
            frames: frame_tx,
            commands: command_tx,
            results: result_rx,
            task,
        }
    }

    async fn run(
        mut self,
        mut frames: watch::Receiver<FrameSlot>,
        mut commands: mpsc::Receiver<SessionCommand>,
    ) {
        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },

                changed = frames.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let slot = frames.borrow_and_update().clone();
                    if let Some((seq, frame)) = slot {
                        self.evaluate(seq, &frame);
                    }
                }
            }
        }

        metrics::record_session_stopped();
        self.logger.log_shutdown(self.frames_evaluated);
    }

    fn apply(&mut self, command: SessionCommand) {
        metrics::record_command(command.name());
        debug!(command = command.name(), "Applying session command");

        let (outcome, reply) = match command {
            SessionCommand::SetReference(analysis, reply) => {
                let outcome = self
                    .evaluator
                    .build_and_set_reference(&analysis)
                    .map_err(SessionError::from);
                match &outcome {
                    Ok(()) => self.logger.log_reference("set"),
                    Err(e) => self.logger.log_warning(&format!("reference rejected: {}", e)),
                }
                (outcome, reply)
            }
            SessionCommand::ClearReference(reply) => {
                self.evaluator.clear_reference();
                self.logger.log_reference("cleared");
                (Ok(()), reply)
            }
            SessionCommand::SetZoom(zoom, reply) => {
                let outcome = self.evaluator.set_zoom_factor(zoom).map_err(SessionError::from);
                (outcome, reply)
            }
            SessionCommand::SetBodyType(body_type, reply) => {
                self.evaluator.set_body_type(body_type);
                (Ok(()), reply)
            }
            SessionCommand::ResetLock(reply) => {
                self.evaluator.reset_lock();
                (Ok(()), reply)
            }
            SessionCommand::Shutdown => return,
        };

        // The caller may have stopped waiting.
        let _ = reply.send(outcome);
    }

    fn evaluate(&mut self, seq: u64, frame: &LiveMetrics) {
        metrics::record_frames_superseded(seq.saturating_sub(self.last_seq + 1));
        self.last_seq = seq;

        let result = self.evaluator.evaluate(frame);
        self.frames_evaluated += 1;
        self.logger.log_result(&result);
        metrics::record_result_published(result.is_perfect);

        let published = PublishedResult {
            session_id: self.logger.session_id(),
            frame_seq: seq,
            published_at: Utc::now(),
            result,
        };
        // Consumers come and go; the handle keeps one receiver alive.
        self.results.send_replace(Some(published));
    }
}
