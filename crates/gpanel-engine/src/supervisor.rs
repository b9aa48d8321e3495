//! Engine process supervision
//!
//! [`ProcessSupervisor`] owns at most one [`EngineProcess`] at a time. All
//! operations are non-blocking requests; what actually happens to the
//! process is reported later as [`EngineEvent`]s on the channel handed to
//! [`ProcessSupervisor::new`]. The owner feeds every received event back
//! through [`EngineControl::observe`] so the lifecycle stays reconciled
//! and stale events from a stopped run can be told apart.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::commands::EngineCommand;
use crate::environment::resolve_program;
use crate::process::EngineProcess;
use gpanel_core::events::{EngineEvent, ExitKind, RunId};
use gpanel_core::prelude::*;

/// Default bytes written to ask the engine to quit
pub const DEFAULT_QUIT_TOKEN: &str = "quit\n";

/// Default time between the quit token and the kill
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_millis(2000);

/// Event channel capacity used by [`ProcessSupervisor::with_channel`]
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Operations a workflow needs from the engine.
///
/// [`ProcessSupervisor`] is the real implementation; tests substitute a
/// recording fake or a mock.
pub trait EngineControl {
    /// Launch the engine, stopping any previous process first
    fn start(&mut self, command: &EngineCommand) -> Result<RunId>;

    /// Queue raw bytes for the engine's input stream
    fn write(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Send the quit token; at most once per run
    fn request_quit(&mut self) -> Result<usize>;

    /// Quit, then terminate. Idempotent and never blocks.
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// A stopped run has not reported its exit yet. Its quit token and
    /// grace period are only honoured while the runtime keeps going.
    fn awaiting_exit(&self) -> bool {
        false
    }

    /// Reconcile with an event received from the event channel.
    ///
    /// Returns `true` if the event belongs to the live run and should be
    /// routed to the active workflow.
    fn observe(&mut self, event: &EngineEvent) -> bool;
}

/// Lifecycle of the most recent run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProcessLifecycle {
    #[default]
    NotStarted,
    Running {
        run: RunId,
        pid: Option<u32>,
    },
    Exited {
        run: RunId,
        code: Option<i32>,
    },
    Crashed {
        run: RunId,
        reason: String,
    },
}

impl ProcessLifecycle {
    pub fn run(&self) -> Option<RunId> {
        match self {
            ProcessLifecycle::NotStarted => None,
            ProcessLifecycle::Running { run, .. }
            | ProcessLifecycle::Exited { run, .. }
            | ProcessLifecycle::Crashed { run, .. } => Some(*run),
        }
    }
}

/// Supervisor tuning
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub quit_token: String,
    pub stop_grace: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            quit_token: DEFAULT_QUIT_TOKEN.to_string(),
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }
}

pub struct ProcessSupervisor {
    config: SupervisorConfig,
    event_tx: mpsc::Sender<EngineEvent>,
    process: Option<EngineProcess>,
    lifecycle: ProcessLifecycle,
    last_run: u64,
    quit_sent: bool,
    /// Stopped runs whose `Exited` event is still to come
    stopping: Vec<RunId>,
}

impl ProcessSupervisor {
    pub fn new(config: SupervisorConfig, event_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            config,
            event_tx,
            process: None,
            lifecycle: ProcessLifecycle::NotStarted,
            last_run: 0,
            quit_sent: false,
            stopping: Vec::new(),
        }
    }

    /// Create a supervisor together with the receiving end of its events
    pub fn with_channel(config: SupervisorConfig) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (Self::new(config, tx), rx)
    }

    pub fn lifecycle(&self) -> &ProcessLifecycle {
        &self.lifecycle
    }

    /// Run id of the live process, if one is held
    pub fn current_run(&self) -> Option<RunId> {
        self.process.as_ref().map(EngineProcess::run)
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(EngineProcess::id)
    }

    /// Events of earlier runs only update the recorded lifecycle
    fn reconcile(&mut self, event: &EngineEvent) -> bool {
        let is_current = self.current_run() == Some(event.run());

        if let EngineEvent::Exited { run, code, kind } = event {
            if self.lifecycle.run() == Some(*run) {
                self.lifecycle = match kind {
                    ExitKind::Normal => ProcessLifecycle::Exited {
                        run: *run,
                        code: *code,
                    },
                    ExitKind::Crashed => ProcessLifecycle::Crashed {
                        run: *run,
                        reason: "engine terminated abnormally".to_string(),
                    },
                };
            }
            if is_current {
                debug!("Releasing handle of exited engine ({})", run);
                self.process = None;
            }
            self.stopping.retain(|r| r != run);
        }

        if !is_current {
            trace!("Ignoring {} from stale {}", event.label(), event.run());
        }
        is_current
    }

    fn next_run(&mut self) -> RunId {
        self.last_run += 1;
        RunId(self.last_run)
    }

    fn spawn(&self, command: &EngineCommand, run: RunId) -> Result<EngineProcess> {
        let program = resolve_program(&command.program)?;
        let resolved = EngineCommand {
            program,
            ..command.clone()
        };
        EngineProcess::spawn(&resolved, run, self.event_tx.clone())
    }
}

impl EngineControl for ProcessSupervisor {
    fn start(&mut self, command: &EngineCommand) -> Result<RunId> {
        if self.process.is_some() {
            info!("Stopping previous engine before starting a new one");
            self.stop();
        }

        let run = self.next_run();
        match self.spawn(command, run) {
            Ok(process) => {
                self.lifecycle = ProcessLifecycle::Running {
                    run,
                    pid: process.id(),
                };
                self.quit_sent = false;
                self.process = Some(process);
                Ok(run)
            }
            Err(e) => {
                let reason = e.to_string();
                error!("Engine launch failed ({}): {}", run, reason);
                self.lifecycle = ProcessLifecycle::Crashed {
                    run,
                    reason: reason.clone(),
                };
                // For log observers; the caller handles the returned error
                if self
                    .event_tx
                    .try_send(EngineEvent::SpawnFailed { run, reason })
                    .is_err()
                {
                    debug!("Event channel unavailable for SpawnFailed");
                }
                Err(e)
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let process = self.process.as_ref().ok_or(Error::NotRunning)?;
        process.write(bytes)
    }

    fn request_quit(&mut self) -> Result<usize> {
        let process = self.process.as_ref().ok_or(Error::NotRunning)?;
        if self.quit_sent {
            return Ok(0);
        }
        let written = process.write(self.config.quit_token.as_bytes())?;
        self.quit_sent = true;
        debug!("Quit token sent to engine ({})", process.run());
        Ok(written)
    }

    fn stop(&mut self) {
        if self.process.is_none() {
            return;
        }

        if let Err(e) = self.request_quit() {
            debug!("Could not send quit token: {}", e);
        }

        if let Some(mut process) = self.process.take() {
            info!("Stopping engine ({})", process.run());
            process.terminate(self.config.stop_grace);
            self.stopping.push(process.run());
        }
    }

    fn is_running(&self) -> bool {
        self.process.as_ref().is_some_and(EngineProcess::is_running)
    }

    fn awaiting_exit(&self) -> bool {
        !self.stopping.is_empty()
    }

    fn observe(&mut self, event: &EngineEvent) -> bool {
        self.reconcile(event)
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.stop();
    }
}
