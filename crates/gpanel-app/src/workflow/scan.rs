//! Channel scan workflow
//!
//! `Idle → Starting → Active → {Completed | Errored | Aborted}`
//!
//! Progress and channel-found notifications update [`ScanProgress`] while
//! active. Malformed progress payloads and empty channel names are dropped
//! without changing state.

use gpanel_core::prelude::*;
use gpanel_core::{ProtocolEvent, ProtocolStatus, ScanOutcome, ScanProgress, WorkflowState};
use gpanel_engine::protocol::{ENTITY_CHANNEL_FOUND, ENTITY_SCAN_PROGRESS, ENTITY_TUNER};
use gpanel_engine::{parse_percent, scan_channels, EngineControl, LaunchContext};

use crate::panel_event::PanelEvent;

/// Reported when a tuner error carries no text
const UNKNOWN_SCAN_ERROR: &str = "The engine reported an error while scanning";

#[derive(Debug, Default)]
pub struct ScanWorkflow {
    state: WorkflowState<ScanOutcome>,
    progress: ScanProgress,
}

impl ScanWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState<ScanOutcome> {
        &self.state
    }

    pub fn progress(&self) -> &ScanProgress {
        &self.progress
    }

    fn is_active(&self) -> bool {
        matches!(self.state, WorkflowState::Active)
    }

    /// Launch the engine in scan mode, rendering into `progress_window_id`
    pub fn start(
        &mut self,
        engine: &mut impl EngineControl,
        ctx: &LaunchContext,
        progress_window_id: &str,
    ) -> Vec<PanelEvent> {
        info!("Starting channel scan");
        self.state = WorkflowState::Starting;
        self.progress = ScanProgress::default();

        match engine.start(&scan_channels(ctx, progress_window_id)) {
            Ok(run) => {
                self.state = WorkflowState::Active;
                vec![PanelEvent::EngineStarted { run }, PanelEvent::ScanStarted]
            }
            Err(e) => self.finish(ScanOutcome::Errored(e.to_string())),
        }
    }

    /// Feed one parsed protocol line
    pub fn on_protocol(
        &mut self,
        engine: &mut impl EngineControl,
        event: &ProtocolEvent,
    ) -> Vec<PanelEvent> {
        if !self.is_active() {
            return Vec::new();
        }

        let ProtocolEvent::Command {
            status,
            entity,
            payload,
        } = event
        else {
            return Vec::new();
        };

        match (status, entity.as_str()) {
            (ProtocolStatus::Ok, ENTITY_SCAN_PROGRESS) => self.on_progress(engine, payload),
            (ProtocolStatus::Ok, ENTITY_CHANNEL_FOUND) => {
                let name = payload.trim();
                if name.is_empty() {
                    debug!("Dropping channel-found event without a name");
                    return Vec::new();
                }
                info!("Channel found: {}", name);
                self.progress.last_channel_found = Some(name.to_string());
                vec![PanelEvent::ChannelFound {
                    name: name.to_string(),
                }]
            }
            (ProtocolStatus::Err, ENTITY_TUNER) => {
                warn!("Tuner error during scan: {:?}", payload);
                self.shutdown(engine);
                let message = if payload.trim().is_empty() {
                    UNKNOWN_SCAN_ERROR.to_string()
                } else {
                    payload.clone()
                };
                self.finish(ScanOutcome::Errored(message))
            }
            (ProtocolStatus::Err, other) => {
                warn!("Engine reported {} error during scan: {:?}", other, payload);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn on_progress(&mut self, engine: &mut impl EngineControl, payload: &str) -> Vec<PanelEvent> {
        let Some(percent) = parse_percent(payload) else {
            debug!("Dropping malformed scan progress {:?}", payload);
            return Vec::new();
        };

        self.progress.percent = percent;
        let mut events = vec![PanelEvent::ScanProgress { percent }];

        if self.progress.is_complete() {
            info!("Channel scan complete");
            self.shutdown(engine);
            events.extend(self.finish(ScanOutcome::Completed));
        }
        events
    }

    /// Caller-initiated abort; always reaches a terminal state
    pub fn abort(&mut self, engine: &mut impl EngineControl) -> Vec<PanelEvent> {
        if !self.state.is_running() {
            return Vec::new();
        }
        info!("Aborting channel scan at {}%", self.progress.percent);
        self.shutdown(engine);
        self.finish(ScanOutcome::Aborted)
    }

    /// The engine exited while this workflow was driving it
    pub fn on_exit(&mut self, code: Option<i32>) -> Vec<PanelEvent> {
        if !self.is_active() {
            return Vec::new();
        }
        warn!("Engine exited ({:?}) during scan", code);
        let message = match code {
            Some(code) => format!("The engine exited during the scan (code {})", code),
            None => "The engine terminated abnormally during the scan".to_string(),
        };
        self.finish(ScanOutcome::Errored(message))
    }

    /// Quit token first, then stop
    fn shutdown(&mut self, engine: &mut impl EngineControl) {
        if let Err(e) = engine.request_quit() {
            debug!("Quit token not sent: {}", e);
        }
        engine.stop();
    }

    fn finish(&mut self, outcome: ScanOutcome) -> Vec<PanelEvent> {
        self.state = WorkflowState::Terminated(outcome.clone());
        vec![PanelEvent::ScanFinished { outcome }]
    }
}
