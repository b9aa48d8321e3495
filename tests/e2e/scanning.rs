//! Channel scans against the mock engine

use serial_test::serial;

use gpanel_app::PanelEvent;
use gpanel_core::ScanOutcome;
use gpanel_engine::EngineControl;

use super::mock_engine::EngineHarness;

#[tokio::test]
#[serial]
async fn test_scan_runs_to_completion() {
    let mut h = EngineHarness::new();

    let events = h.panel.scan();
    assert!(events.contains(&PanelEvent::ScanStarted));

    let events = h
        .pump_until(|e| matches!(e, PanelEvent::ScanFinished { .. }))
        .await;
    let progress: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            PanelEvent::ScanProgress { percent } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![10, 100]);
    assert!(events.contains(&PanelEvent::ChannelFound {
        name: "TV Brasil".to_string()
    }));
    assert_eq!(
        events.last(),
        Some(&PanelEvent::ScanFinished {
            outcome: ScanOutcome::Completed
        })
    );

    assert!(!h.panel.is_active());
    h.wait_stopped().await;
}

#[tokio::test]
#[serial]
async fn test_aborted_scan_ignores_late_output() {
    let mut h = EngineHarness::new();

    h.panel.scan();
    assert_eq!(
        h.panel.abort_scan(),
        vec![PanelEvent::ScanFinished {
            outcome: ScanOutcome::Aborted
        }]
    );
    assert!(!h.panel.engine().is_running());

    // Whatever the stopped run still prints belongs to a stale run
    while let Ok(Some(event)) = crate::with_timeout(500, h.events.recv()).await {
        assert!(h.panel.handle_engine_event(&event).is_empty());
    }
}
