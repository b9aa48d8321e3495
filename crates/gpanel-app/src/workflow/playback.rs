//! Playback of documents, device roles and tuned channels
//!
//! `Idle → Active → {Ended | EngineError | Stopped}`

use gpanel_core::prelude::*;
use gpanel_core::{PlaybackOutcome, ProtocolEvent, WorkflowState};
use gpanel_engine::{EngineCommand, EngineControl};

use crate::panel_event::PanelEvent;

#[derive(Debug, Default)]
pub struct PlaybackWorkflow {
    state: WorkflowState<PlaybackOutcome>,
    target: String,
}

impl PlaybackWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take over an engine that is already playing (a channel that finished
    /// tuning)
    pub fn attached(target: impl Into<String>) -> Self {
        Self {
            state: WorkflowState::Active,
            target: target.into(),
        }
    }

    pub fn state(&self) -> &WorkflowState<PlaybackOutcome> {
        &self.state
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn start(
        &mut self,
        engine: &mut impl EngineControl,
        command: &EngineCommand,
        target: impl Into<String>,
    ) -> Vec<PanelEvent> {
        self.target = target.into();
        self.state = WorkflowState::Starting;

        match engine.start(command) {
            Ok(run) => {
                info!("Playing {}", self.target);
                self.state = WorkflowState::Active;
                vec![
                    PanelEvent::EngineStarted { run },
                    PanelEvent::PlaybackStarted {
                        target: self.target.clone(),
                    },
                ]
            }
            Err(e) => self.finish(PlaybackOutcome::EngineError {
                message: e.to_string(),
            }),
        }
    }

    /// Status-1 events end playback with the engine's message
    pub fn on_protocol(
        &mut self,
        engine: &mut impl EngineControl,
        event: &ProtocolEvent,
    ) -> Vec<PanelEvent> {
        if !matches!(self.state, WorkflowState::Active) {
            return Vec::new();
        }
        let Some(message) = event.error_payload() else {
            return Vec::new();
        };

        warn!("Engine error during playback of {}: {:?}", self.target, message);
        if let Err(e) = engine.request_quit() {
            debug!("Quit token not sent: {}", e);
        }
        engine.stop();
        self.finish(PlaybackOutcome::EngineError {
            message: message.to_string(),
        })
    }

    pub fn on_exit(&mut self, code: Option<i32>) -> Vec<PanelEvent> {
        if !matches!(self.state, WorkflowState::Active) {
            return Vec::new();
        }
        info!("Playback of {} ended ({:?})", self.target, code);
        self.finish(PlaybackOutcome::Ended { code })
    }

    pub fn stop(&mut self, engine: &mut impl EngineControl) -> Vec<PanelEvent> {
        if !self.state.is_running() {
            return Vec::new();
        }
        self.state = WorkflowState::Finishing;
        engine.stop();
        self.finish(PlaybackOutcome::Stopped)
    }

    fn finish(&mut self, outcome: PlaybackOutcome) -> Vec<PanelEvent> {
        self.state = WorkflowState::Terminated(outcome.clone());
        vec![PanelEvent::PlaybackFinished {
            target: self.target.clone(),
            outcome,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpanel_engine::parse_line;
    use gpanel_engine::test_utils::FakeEngine;

    fn outcome(events: &[PanelEvent]) -> Option<&PlaybackOutcome> {
        events.iter().find_map(|e| match e {
            PanelEvent::PlaybackFinished { outcome, .. } => Some(outcome),
            _ => None,
        })
    }

    #[test]
    fn test_start_and_natural_end() {
        let mut engine = FakeEngine::new();
        let mut workflow = PlaybackWorkflow::new();

        let events = workflow.start(&mut engine, &EngineCommand::default(), "main.ncl");
        assert!(events.contains(&PanelEvent::PlaybackStarted {
            target: "main.ncl".to_string()
        }));
        assert_eq!(workflow.state(), &WorkflowState::Active);

        let events = workflow.on_exit(Some(0));
        assert_eq!(
            outcome(&events),
            Some(&PlaybackOutcome::Ended { code: Some(0) })
        );
        assert!(workflow.on_exit(Some(0)).is_empty());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut engine = FakeEngine::new();
        let mut workflow = PlaybackWorkflow::new();
        workflow.start(&mut engine, &EngineCommand::default(), "main.ncl");

        assert_eq!(
            outcome(&workflow.stop(&mut engine)),
            Some(&PlaybackOutcome::Stopped)
        );
        assert!(workflow.stop(&mut engine).is_empty());
        assert_eq!(engine.stop_count(), 1);
        // Late exit after stop is not reported
        assert!(workflow.on_exit(None).is_empty());
    }

    #[test]
    fn test_engine_error_ends_playback() {
        let mut engine = FakeEngine::new();
        let mut workflow = PlaybackWorkflow::attached("5 - TV Brasil");

        assert!(workflow
            .on_protocol(&mut engine, &parse_line("cmd::0::start::?mAV?"))
            .is_empty());

        let events = workflow.on_protocol(&mut engine, &parse_line("cmd::1::player::codec"));
        assert_eq!(
            outcome(&events),
            Some(&PlaybackOutcome::EngineError {
                message: "codec".to_string()
            })
        );
    }

    #[test]
    fn test_spawn_failure() {
        let mut engine = FakeEngine::failing();
        let mut workflow = PlaybackWorkflow::new();

        let events = workflow.start(&mut engine, &EngineCommand::default(), "main.ncl");
        assert_eq!(events.len(), 1);
        assert!(matches!(
            outcome(&events),
            Some(PlaybackOutcome::EngineError { .. })
        ));
    }
}
