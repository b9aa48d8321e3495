//! Documents and device roles against the mock engine

use std::fs;

use serial_test::serial;

use gpanel_app::config::load_state;
use gpanel_app::{PanelEvent, PassiveGuard};
use gpanel_core::{DeviceRole, Error, PlaybackOutcome};

use super::mock_engine::EngineHarness;

fn playback_outcome(events: &[PanelEvent]) -> Option<&PlaybackOutcome> {
    events.iter().find_map(|e| match e {
        PanelEvent::PlaybackFinished { outcome, .. } => Some(outcome),
        _ => None,
    })
}

#[tokio::test]
#[serial]
async fn test_document_plays_until_engine_quits() {
    let mut h = EngineHarness::new();
    let document = h.path("main.ncl");
    fs::write(&document, "<ncl/>").unwrap();

    let events = h.panel.load(&document).unwrap();
    assert!(matches!(
        events.as_slice(),
        [PanelEvent::DocumentLoaded { .. }]
    ));

    let events = h.panel.play().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, PanelEvent::PlaybackStarted { .. })));

    let events = h
        .pump_until(|e| matches!(e, PanelEvent::EngineOutput { line, .. } if line.starts_with("ginga: presenting")))
        .await;
    assert!(events.iter().any(|e| matches!(
        e,
        PanelEvent::EngineOutput { line, .. } if line.ends_with("main.ncl")
    )));

    // The engine leaves on its own after reading quit
    h.panel.send_command("quit").unwrap();
    let events = h.pump_until(PanelEvent::is_terminal).await;
    assert_eq!(
        playback_outcome(&events),
        Some(&PlaybackOutcome::Ended { code: Some(0) })
    );
    assert!(!h.panel.is_active());

    let state = load_state(&h.path("state.toml"));
    assert_eq!(state.recent_files.len(), 1);
}

#[tokio::test]
#[serial]
async fn test_active_role_serves_next_port() {
    let mut h = EngineHarness::with_settings(|s| s.behavior.run_as = DeviceRole::Active);

    let events = h.panel.run().unwrap();
    assert!(events.contains(&PanelEvent::PlaybackStarted {
        target: "active device on port 22223".to_string()
    }));

    let events = h.panel.stop();
    assert_eq!(playback_outcome(&events), Some(&PlaybackOutcome::Stopped));
    assert_eq!(
        load_state(&h.path("state.toml")).device_port,
        Some(22223)
    );
}

#[tokio::test]
#[serial]
async fn test_passive_role_is_single_instance() {
    let mut h = EngineHarness::with_settings(|s| s.behavior.run_as = DeviceRole::Passive);
    let lock = h.path("passive.lock");

    h.panel.run().unwrap();
    assert!(h.panel.holds_passive_lock());
    assert!(matches!(
        PassiveGuard::acquire(&lock),
        Err(Error::PassiveAlreadyRunning)
    ));

    h.panel.stop();
    assert!(PassiveGuard::acquire(&lock).is_ok());
}
