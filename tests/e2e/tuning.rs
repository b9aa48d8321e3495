//! Tuning against the mock engine

use std::path::PathBuf;
use std::time::Instant;

use serial_test::serial;

use gpanel_app::config::load_state;
use gpanel_app::{PanelEvent, WEAK_SIGNAL_MESSAGE};
use gpanel_core::{Channel, PlaybackOutcome, TuneOutcome};
use gpanel_engine::EngineControl;

use super::mock_engine::EngineHarness;
use crate::terminal;

fn tv_brasil() -> Channel {
    Channel::new("647142", "5", "TV Brasil")
}

fn tune_outcome(events: &[PanelEvent]) -> Option<&TuneOutcome> {
    events.iter().find_map(|e| match e {
        PanelEvent::TuneFinished { outcome, .. } => Some(outcome),
        _ => None,
    })
}

#[tokio::test]
#[serial]
async fn test_tune_reaches_stream_then_stop() {
    let mut h = EngineHarness::new();

    let events = h.panel.tune(tv_brasil());
    assert!(events.contains(&PanelEvent::TuningStarted {
        channel: tv_brasil()
    }));

    let events = h
        .pump_until(|e| matches!(e, PanelEvent::TuneFinished { .. }))
        .await;
    assert_eq!(tune_outcome(&events), Some(&TuneOutcome::Streaming));
    assert!(h.panel.is_active());

    // The stream keeps playing and accepts developer commands
    h.panel.send_command("key RED").unwrap();
    h.pump_until(|e| matches!(e, PanelEvent::EngineOutput { line, .. } if line == "got key RED"))
        .await;

    let events = h.panel.stop();
    assert_eq!(
        events,
        vec![PanelEvent::PlaybackFinished {
            target: "5 - TV Brasil".to_string(),
            outcome: PlaybackOutcome::Stopped,
        }]
    );
    h.wait_stopped().await;

    let state = load_state(&h.path("state.toml"));
    assert_eq!(state.last_channel, Some(tv_brasil()));
}

#[tokio::test]
#[serial]
async fn test_tuner_error_is_reported() {
    let mut h = EngineHarness::new();

    h.panel.tune(Channel::new("111", "1", "Weak"));
    let events = h.pump_until(PanelEvent::is_terminal).await;

    assert_eq!(
        tune_outcome(&events),
        Some(&TuneOutcome::EngineError("weak signal".to_string()))
    );
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert!(!h.panel.is_active());
    assert!(!h.panel.engine().is_running());
}

#[tokio::test]
#[serial]
async fn test_engine_exit_while_tuning_means_weak_signal() {
    let mut h = EngineHarness::new();

    h.panel.tune(Channel::new("222", "2", "Gone"));
    let events = h.pump_until(PanelEvent::is_terminal).await;

    assert_eq!(
        tune_outcome(&events),
        Some(&TuneOutcome::EngineError(WEAK_SIGNAL_MESSAGE.to_string()))
    );
    // Output is drained before the exit is reported
    assert!(h.panel.devlog().lines().contains(&"no lock"));
}

#[tokio::test]
#[serial]
async fn test_timeout_prompt_declined_stops_engine() {
    let mut h = EngineHarness::with_settings(|s| s.tuning.timeout_secs = 0);

    h.panel.tune(Channel::new("333", "3", "Silent"));
    assert!(h.panel.next_deadline().is_some());

    let events = h.panel.on_deadline(Instant::now());
    assert!(matches!(
        events.as_slice(),
        [PanelEvent::ConfirmKeepWaiting { .. }]
    ));

    let events = h.panel.resolve_timeout(false);
    assert_eq!(tune_outcome(&events), Some(&TuneOutcome::WeakSignalTimeout));
    assert!(!h.panel.is_active());
    h.wait_stopped().await;
}

#[tokio::test]
#[serial]
async fn test_missing_binary_fails_tuning() {
    let mut h = EngineHarness::with_settings(|s| {
        s.engine.binary = PathBuf::from("/nonexistent/ginga-panel/ginga")
    });

    let events = h.panel.tune(tv_brasil());
    match terminal(&events) {
        Some(PanelEvent::TuneFinished {
            outcome: TuneOutcome::EngineError(message),
            ..
        }) => assert!(message.contains("Check the binary path"), "{}", message),
        other => panic!("expected engine error, got {:?}", other),
    }
    assert!(!h.panel.is_active());
}

#[tokio::test]
#[serial]
async fn test_retune_ignores_previous_run() {
    let mut h = EngineHarness::new();

    h.panel.tune(Channel::new("333", "3", "Silent"));
    let events = h.panel.tune(tv_brasil());
    assert_eq!(tune_outcome(&events), Some(&TuneOutcome::UserCancelled));

    let events = h
        .pump_until(|e| matches!(e, PanelEvent::TuneFinished { .. }))
        .await;
    match terminal(&events) {
        Some(PanelEvent::TuneFinished { channel, outcome }) => {
            assert_eq!(channel, &tv_brasil());
            assert_eq!(outcome, &TuneOutcome::Streaming);
        }
        other => panic!("expected tune result, got {:?}", other),
    }

    h.panel.stop();
}
