//! Domain event definitions

use std::fmt;

use serde::Serialize;

use crate::types::OutputStream;

// ─────────────────────────────────────────────────────────
// Protocol Events (parsed engine output)
// ─────────────────────────────────────────────────────────

/// Status segment of a protocol command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolStatus {
    /// Segment was exactly `"0"`
    Ok,
    /// Anything else
    Err,
}

/// One parsed line of engine output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    /// Not a protocol line; carries the line exactly as received
    Log(String),

    /// `cmd::<status>::<entity>::<payload>`
    Command {
        status: ProtocolStatus,
        entity: String,
        payload: String,
    },
}

impl ProtocolEvent {
    pub fn is_log(&self) -> bool {
        matches!(self, ProtocolEvent::Log(_))
    }

    /// `Some(payload)` when this is a command with the given status and entity
    pub fn command_payload(&self, status: ProtocolStatus, entity: &str) -> Option<&str> {
        match self {
            ProtocolEvent::Command {
                status: s,
                entity: e,
                payload,
            } if *s == status && e == entity => Some(payload),
            _ => None,
        }
    }

    /// Payload of any error-status command
    pub fn error_payload(&self) -> Option<&str> {
        match self {
            ProtocolEvent::Command {
                status: ProtocolStatus::Err,
                payload,
                ..
            } => Some(payload),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Engine Process Events
// ─────────────────────────────────────────────────────────

/// Identifies one launch of the engine.
///
/// Every event carries the run it came from so that a late exit from a
/// stopped process is never mistaken for the exit of its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// How the engine process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitKind {
    /// Exited on its own with an exit code
    Normal,
    /// Terminated by a signal or the wait failed
    Crashed,
}

/// Events from the engine process
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// One complete output line (terminator stripped)
    Output {
        run: RunId,
        stream: OutputStream,
        line: String,
    },

    /// Process has exited
    Exited {
        run: RunId,
        code: Option<i32>,
        kind: ExitKind,
    },

    /// Process could not be launched
    SpawnFailed { run: RunId, reason: String },
}

impl EngineEvent {
    pub fn run(&self) -> RunId {
        match self {
            EngineEvent::Output { run, .. }
            | EngineEvent::Exited { run, .. }
            | EngineEvent::SpawnFailed { run, .. } => *run,
        }
    }

    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            EngineEvent::Output {
                stream: OutputStream::Stdout,
                ..
            } => "Stdout",
            EngineEvent::Output {
                stream: OutputStream::Stderr,
                ..
            } => "Stderr",
            EngineEvent::Exited { .. } => "Exited",
            EngineEvent::SpawnFailed { .. } => "SpawnFailed",
        }
    }
}
