//! Channel tuning workflow
//!
//! ```text
//! Idle → Starting → Awaiting(Armed) ──stream started──────────→ Streaming
//!                        │          ──status-1 event──────────→ EngineError
//!                        │          ──engine exit─────────────→ EngineError (weak signal)
//!                        └─deadline→ Awaiting(Prompting) ─no──→ WeakSignalTimeout
//!                                         └─yes→ Awaiting(Disarmed)
//! cancel from any running state ──────────────────────────────→ UserCancelled
//! ```
//!
//! The deadline fires once. Keeping the wait disarms it for good.

use std::time::{Duration, Instant};

use gpanel_core::prelude::*;
use gpanel_core::{Channel, Deadline, ProtocolEvent, TuneOutcome, WorkflowState};
use gpanel_engine::{is_stream_started, tune_channel, EngineControl, LaunchContext};

use crate::panel_event::PanelEvent;

/// Reported when the engine exits before the stream starts
pub const WEAK_SIGNAL_MESSAGE: &str =
    "The signal's strength is too weak to play this channel. Please check your antenna.";

/// Message when the engine reports an error without text
const UNKNOWN_ENGINE_ERROR: &str = "The engine reported an error while tuning";

#[derive(Debug)]
pub struct TuningWorkflow {
    state: WorkflowState<TuneOutcome>,
    channel: Channel,
    timeout: Duration,
}

impl TuningWorkflow {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: WorkflowState::Idle,
            channel: Channel::null(),
            timeout,
        }
    }

    pub fn state(&self) -> &WorkflowState<TuneOutcome> {
        &self.state
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// When the keep-waiting prompt is due, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.state.deadline()
    }

    /// True while the keep-waiting prompt is open
    pub fn is_prompting(&self) -> bool {
        matches!(self.state, WorkflowState::Awaiting(Deadline::Prompting))
    }

    fn is_awaiting(&self) -> bool {
        matches!(self.state, WorkflowState::Awaiting(_))
    }

    /// Launch the engine tuned to `channel`. A null channel is ignored.
    pub fn start(
        &mut self,
        engine: &mut impl EngineControl,
        ctx: &LaunchContext,
        channel: Channel,
        now: Instant,
    ) -> Vec<PanelEvent> {
        if channel.is_null() {
            debug!("Ignoring tune request for a null channel");
            return Vec::new();
        }

        info!("Tuning {} ({})", channel.label(), channel.frequency);
        self.channel = channel;
        self.state = WorkflowState::Starting;

        let command = tune_channel(ctx, &self.channel.frequency);
        match engine.start(&command) {
            Ok(run) => {
                self.state = WorkflowState::Awaiting(Deadline::Armed(now + self.timeout));
                vec![
                    PanelEvent::EngineStarted { run },
                    PanelEvent::TuningStarted {
                        channel: self.channel.clone(),
                    },
                ]
            }
            Err(e) => self.finish(TuneOutcome::EngineError(e.to_string())),
        }
    }

    /// Feed one parsed protocol line
    pub fn on_protocol(
        &mut self,
        engine: &mut impl EngineControl,
        event: &ProtocolEvent,
    ) -> Vec<PanelEvent> {
        if !self.is_awaiting() {
            return Vec::new();
        }

        if is_stream_started(event) {
            info!("Stream started on {}", self.channel.label());
            return self.finish(TuneOutcome::Streaming);
        }

        if let Some(message) = event.error_payload() {
            warn!("Engine error while tuning: {:?}", message);
            if let Err(e) = engine.request_quit() {
                debug!("Quit token not sent: {}", e);
            }
            engine.stop();
            let message = if message.trim().is_empty() {
                UNKNOWN_ENGINE_ERROR.to_string()
            } else {
                message.to_string()
            };
            return self.finish(TuneOutcome::EngineError(message));
        }

        Vec::new()
    }

    /// The engine exited while this workflow was driving it
    pub fn on_exit(&mut self, code: Option<i32>) -> Vec<PanelEvent> {
        if !self.is_awaiting() {
            return Vec::new();
        }
        warn!("Engine exited ({:?}) before the stream started", code);
        self.finish(TuneOutcome::EngineError(WEAK_SIGNAL_MESSAGE.to_string()))
    }

    /// Fire the deadline if it is due. Yields the prompt at most once.
    pub fn on_deadline(&mut self, now: Instant) -> Vec<PanelEvent> {
        match self.state {
            WorkflowState::Awaiting(Deadline::Armed(at)) if now >= at => {
                info!("No stream after {:?}, asking whether to keep waiting", self.timeout);
                self.state = WorkflowState::Awaiting(Deadline::Prompting);
                vec![PanelEvent::ConfirmKeepWaiting {
                    channel: self.channel.clone(),
                }]
            }
            _ => Vec::new(),
        }
    }

    /// Answer the keep-waiting prompt
    pub fn resolve_timeout(
        &mut self,
        engine: &mut impl EngineControl,
        keep_waiting: bool,
    ) -> Vec<PanelEvent> {
        if !self.is_prompting() {
            debug!("No keep-waiting prompt open");
            return Vec::new();
        }

        if keep_waiting {
            info!("Waiting for {} without a deadline", self.channel.label());
            self.state = WorkflowState::Awaiting(Deadline::Disarmed);
            Vec::new()
        } else {
            engine.stop();
            self.finish(TuneOutcome::WeakSignalTimeout)
        }
    }

    /// Abandon the attempt
    pub fn cancel(&mut self, engine: &mut impl EngineControl) -> Vec<PanelEvent> {
        if !self.state.is_running() {
            return Vec::new();
        }
        engine.stop();
        self.finish(TuneOutcome::UserCancelled)
    }

    fn finish(&mut self, outcome: TuneOutcome) -> Vec<PanelEvent> {
        self.state = WorkflowState::Terminated(outcome.clone());
        vec![PanelEvent::TuneFinished {
            channel: self.channel.clone(),
            outcome,
        }]
    }
}
