//! Scripted stand-in for the Ginga engine
//!
//! The script picks its behavior from the tuner argument:
//!
//! | Argument        | Behavior                                           |
//! |-----------------|----------------------------------------------------|
//! | `sbtvdt:scan`   | progress 10%, one channel, progress 100%           |
//! | `sbtvdt:111`    | tuner error `weak signal`                          |
//! | `sbtvdt:222`    | exits with code 3 before the stream starts         |
//! | `sbtvdt:333`    | prints nothing (never starts streaming)            |
//! | other `sbtvdt:` | stream started                                     |
//! | `--ncl`         | banner line                                        |
//!
//! Afterwards every stdin line is echoed as `got <line>` until `quit`. When
//! `GPANEL_QUIT_MARKER` is set, reading `quit` appends a line to that file.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use gpanel_app::config::PanelState;
use gpanel_app::{Panel, PanelEvent, PanelPaths, Settings};
use gpanel_core::EngineEvent;
use gpanel_engine::{EngineControl, ProcessSupervisor};

const ENGINE_SCRIPT: &str = r#"#!/bin/sh
case "$*" in
  *sbtvdt:scan*)
    echo "cmd::0::tunerscanprogress::10%"
    echo "cmd::0::channelfound::TV Brasil"
    echo "cmd::0::tunerscanprogress::100%"
    ;;
  *sbtvdt:111*)
    echo "locking tuner"
    echo "cmd::1::tuner::weak signal"
    ;;
  *sbtvdt:222*)
    echo "no lock" >&2
    exit 3
    ;;
  *sbtvdt:333*)
    ;;
  *sbtvdt:*)
    echo "cmd::0::start::?mAV?"
    ;;
  *--ncl*)
    echo "ginga: presenting $2"
    ;;
esac
while read line; do
  if [ "$line" = "quit" ]; then
    if [ -n "$GPANEL_QUIT_MARKER" ]; then
      echo quit >> "$GPANEL_QUIT_MARKER"
    fi
    exit 0
  fi
  echo "got $line"
done
"#;

/// Panel wired to a real supervisor running the mock engine script
pub struct EngineHarness {
    pub panel: Panel<ProcessSupervisor>,
    pub events: mpsc::Receiver<EngineEvent>,
    pub dir: TempDir,
}

impl EngineHarness {
    pub fn new() -> Self {
        Self::with_settings(|_| {})
    }

    /// Adjust the generated settings before the panel is built
    pub fn with_settings(configure: impl FnOnce(&mut Settings)) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let script = dir.path().join("ginga-mock.sh");
        fs::write(&script, ENGINE_SCRIPT).expect("write script");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod script");

        let mut settings = crate::test_settings(&script, dir.path());
        configure(&mut settings);

        let paths = PanelPaths {
            state_file: Some(dir.path().join("state.toml")),
            passive_lock: dir.path().join("passive.lock"),
            carousel_dir: dir.path().join("carousel"),
        };
        let (engine, events) =
            ProcessSupervisor::with_channel(settings.engine.supervisor_config());
        let panel = Panel::new(engine, settings, PanelState::default(), paths);

        Self { panel, events, dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Feed engine events to the panel until `done` matches one of the
    /// resulting panel events. Returns everything the panel emitted.
    pub async fn pump_until(&mut self, done: impl Fn(&PanelEvent) -> bool) -> Vec<PanelEvent> {
        let mut collected = Vec::new();
        loop {
            let event = crate::with_timeout(10_000, self.events.recv())
                .await
                .expect("engine went quiet")
                .expect("engine channel closed");
            let emitted = self.panel.handle_engine_event(&event);
            let finished = emitted.iter().any(&done);
            collected.extend(emitted);
            if finished {
                return collected;
            }
        }
    }

    /// Wait for the engine process to be gone
    pub async fn wait_stopped(&mut self) {
        for _ in 0..100 {
            if !self.panel.engine().is_running() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("engine still running");
    }
}
