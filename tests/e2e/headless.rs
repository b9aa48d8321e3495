//! Headless runs against the mock engine

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serial_test::serial;
use tempfile::TempDir;
use tokio::sync::mpsc;

use ginga_panel::{drive_panel, Command, StartAction};
use gpanel_core::Channel;
use gpanel_engine::EngineControl;

use super::mock_engine::EngineHarness;

fn harness_with_quit_marker(marker: &Path) -> EngineHarness {
    let marker = marker.display().to_string();
    EngineHarness::with_settings(|settings| {
        settings.engine.env = Some(BTreeMap::from([(
            "GPANEL_QUIT_MARKER".to_string(),
            marker,
        )]));
    })
}

#[tokio::test]
#[serial]
async fn test_completed_scan_delivers_quit_before_returning() {
    let marker_dir = TempDir::new().unwrap();
    let marker = marker_dir.path().join("quit.marker");
    let mut h = harness_with_quit_marker(&marker);
    let (_cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(4);

    let result = crate::with_timeout(
        10_000,
        drive_panel(&mut h.panel, &mut h.events, &mut cmd_rx, StartAction::Scan),
    )
    .await
    .expect("headless run hung");
    assert!(result.is_ok());

    // The engine read the quit token and exited before the run returned
    assert!(!h.panel.engine().awaiting_exit());
    assert_eq!(fs::read_to_string(&marker).unwrap(), "quit\n");
}

#[tokio::test]
#[serial]
async fn test_quit_command_stops_streaming_engine_politely() {
    let marker_dir = TempDir::new().unwrap();
    let marker = marker_dir.path().join("quit.marker");
    let mut h = harness_with_quit_marker(&marker);
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(4);
    cmd_tx.send(Command::Quit).await.unwrap();

    let result = crate::with_timeout(
        10_000,
        drive_panel(
            &mut h.panel,
            &mut h.events,
            &mut cmd_rx,
            StartAction::Tune(Channel::new("599142", "3", "Cultura")),
        ),
    )
    .await
    .expect("headless run hung");
    assert!(result.is_ok());

    assert!(!h.panel.is_active());
    assert!(!h.panel.engine().awaiting_exit());
    assert_eq!(fs::read_to_string(&marker).unwrap(), "quit\n");
}
