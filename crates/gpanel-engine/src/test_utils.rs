//! Test utilities for engine consumers
//!
//! [`FakeEngine`] records every call made through [`EngineControl`] so
//! workflow tests can assert on what was launched and in which order the
//! quit token and stop were issued. The event builders produce the
//! [`EngineEvent`]s a real engine would emit.

use gpanel_core::events::{EngineEvent, ExitKind, RunId};
use gpanel_core::prelude::*;
use gpanel_core::OutputStream;

use crate::commands::EngineCommand;
use crate::supervisor::EngineControl;

/// One recorded call on the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Start(EngineCommand),
    Write(Vec<u8>),
    Quit,
    Stop,
}

/// Recording stand-in for the process supervisor
#[derive(Debug, Default)]
pub struct FakeEngine {
    pub calls: Vec<EngineCall>,
    /// When set, `start` fails with `EngineNotFound`
    pub fail_spawn: bool,
    running: bool,
    last_run: u64,
    quit_sent: bool,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fake whose launches always fail
    pub fn failing() -> Self {
        Self {
            fail_spawn: true,
            ..Self::default()
        }
    }

    /// Run id handed out by the most recent successful `start`
    pub fn current_run(&self) -> RunId {
        RunId(self.last_run)
    }

    /// Commands passed to `start`, in order
    pub fn started(&self) -> Vec<&EngineCommand> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::Start(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    pub fn start_count(&self) -> usize {
        self.started().len()
    }

    pub fn quit_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == EngineCall::Quit).count()
    }

    pub fn stop_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == EngineCall::Stop).count()
    }

    /// Simulate the engine going away on its own
    pub fn mark_exited(&mut self) {
        self.running = false;
    }

    /// Position of the first matching call
    pub fn position(&self, call: &EngineCall) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }
}

impl EngineControl for FakeEngine {
    fn start(&mut self, command: &EngineCommand) -> Result<RunId> {
        if self.running {
            self.stop();
        }
        self.calls.push(EngineCall::Start(command.clone()));
        if self.fail_spawn {
            return Err(Error::EngineNotFound {
                path: command.program.clone(),
            });
        }
        self.last_run += 1;
        self.running = true;
        self.quit_sent = false;
        Ok(RunId(self.last_run))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        if !self.running {
            return Err(Error::NotRunning);
        }
        self.calls.push(EngineCall::Write(bytes.to_vec()));
        Ok(bytes.len())
    }

    fn request_quit(&mut self) -> Result<usize> {
        if !self.running {
            return Err(Error::NotRunning);
        }
        if self.quit_sent {
            return Ok(0);
        }
        self.quit_sent = true;
        self.calls.push(EngineCall::Quit);
        Ok(5)
    }

    fn stop(&mut self) {
        if !self.running {
            return;
        }
        let _ = self.request_quit();
        self.running = false;
        self.calls.push(EngineCall::Stop);
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn observe(&mut self, event: &EngineEvent) -> bool {
        let current = self.running && event.run() == self.current_run();
        if current && matches!(event, EngineEvent::Exited { .. }) {
            self.running = false;
        }
        current
    }
}

// ─────────────────────────────────────────────────────────
// Event builders
// ─────────────────────────────────────────────────────────

/// A stdout line from `run`
pub fn stdout_line(run: RunId, line: &str) -> EngineEvent {
    EngineEvent::Output {
        run,
        stream: OutputStream::Stdout,
        line: line.to_string(),
    }
}

/// A stderr line from `run`
pub fn stderr_line(run: RunId, line: &str) -> EngineEvent {
    EngineEvent::Output {
        run,
        stream: OutputStream::Stderr,
        line: line.to_string(),
    }
}

/// Normal exit of `run`
pub fn exited(run: RunId, code: i32) -> EngineEvent {
    EngineEvent::Exited {
        run,
        code: Some(code),
        kind: ExitKind::Normal,
    }
}

/// Abnormal termination of `run`
pub fn crashed(run: RunId) -> EngineEvent {
    EngineEvent::Exited {
        run,
        code: None,
        kind: ExitKind::Crashed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_records_quit_before_stop() {
        let mut engine = FakeEngine::new();
        engine.start(&EngineCommand::default()).unwrap();
        engine.stop();
        engine.stop();

        assert_eq!(engine.quit_count(), 1);
        assert_eq!(engine.stop_count(), 1);
        assert!(engine.position(&EngineCall::Quit) < engine.position(&EngineCall::Stop));
    }

    #[test]
    fn test_failing_fake() {
        let mut engine = FakeEngine::failing();
        assert!(engine.start(&EngineCommand::default()).is_err());
        assert!(!engine.is_running());
        assert_eq!(engine.start_count(), 1);
    }
}
