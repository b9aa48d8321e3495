//! Workflow states and terminal outcomes shared by tuning, scanning and playback

use std::time::Instant;

use serde::Serialize;

/// Tuning deadline bookkeeping while awaiting the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Fires once at the given instant
    Armed(Instant),
    /// Fired; waiting for the caller's keep-waiting decision
    Prompting,
    /// Caller chose to keep waiting without a deadline
    Disarmed,
}

/// Lifecycle of a workflow, generic over its terminal outcome
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState<O> {
    #[default]
    Idle,
    Starting,
    Awaiting(Deadline),
    Active,
    Finishing,
    Terminated(O),
}

impl<O> WorkflowState<O> {
    pub fn is_idle(&self) -> bool {
        matches!(self, WorkflowState::Idle)
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, WorkflowState::Terminated(_))
    }

    /// True while the workflow holds a live engine process
    pub fn is_running(&self) -> bool {
        !matches!(self, WorkflowState::Idle | WorkflowState::Terminated(_))
    }

    pub fn outcome(&self) -> Option<&O> {
        match self {
            WorkflowState::Terminated(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// The armed deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        match self {
            WorkflowState::Awaiting(Deadline::Armed(at)) => Some(*at),
            _ => None,
        }
    }
}

/// Terminal result of a tuning attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum TuneOutcome {
    /// Engine reported the audio/video stream started
    Streaming,
    /// Deadline elapsed and the caller declined to keep waiting
    WeakSignalTimeout,
    /// Engine reported an error, crashed, or could not be launched
    EngineError(String),
    /// Caller cancelled the attempt
    UserCancelled,
}

/// Terminal result of a channel scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Progress reached 100%
    Completed,
    /// Engine reported a tuner error, crashed, or could not be launched
    Errored(String),
    /// Caller aborted the scan
    Aborted,
}

/// Terminal result of document playback or a device-role run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlaybackOutcome {
    /// Engine exited on its own
    Ended { code: Option<i32> },
    /// Engine reported an error or could not be launched
    EngineError { message: String },
    /// Caller stopped playback
    Stopped,
}

/// Scan progress accumulator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    /// 0..=100
    pub percent: u8,
    pub last_channel_found: Option<String>,
}

impl ScanProgress {
    pub fn is_complete(&self) -> bool {
        self.percent >= 100
    }
}
