//! Headless mode - JSON event output
//!
//! Stands in for a windowed front end: every [`PanelEvent`] is written to
//! stdout as NDJSON (newline-delimited JSON), one event per line, and stdin
//! lines are read as commands (see [`runner`]).
//!
//! # Example Output
//!
//! ```json
//! {"event":"engine_started","run":1,"timestamp":1704700001000}
//! {"event":"scan_progress","percent":47,"timestamp":1704700002000}
//! {"event":"scan_finished","outcome":"completed","timestamp":1704700003000}
//! ```

pub mod runner;

use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tracing::error;

use gpanel_app::PanelEvent;
use gpanel_core::{Channel, OutputStream, PlaybackOutcome, RunId, ScanOutcome, TuneOutcome};

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    EngineStarted { run: RunId, timestamp: i64 },

    /// Raw engine line
    EngineOutput {
        stream: OutputStream,
        line: String,
        timestamp: i64,
    },

    DocumentLoaded { path: PathBuf, timestamp: i64 },

    TuningStarted { channel: Channel, timestamp: i64 },

    /// Answer with `wait` or `no-wait` on stdin
    ConfirmKeepWaiting { channel: Channel, timestamp: i64 },

    TuneFinished {
        channel: Channel,
        #[serde(flatten)]
        outcome: TuneOutcome,
        timestamp: i64,
    },

    ScanStarted { timestamp: i64 },

    ScanProgress { percent: u8, timestamp: i64 },

    ChannelFound { name: String, timestamp: i64 },

    ScanFinished {
        #[serde(flatten)]
        outcome: ScanOutcome,
        timestamp: i64,
    },

    PlaybackStarted { target: String, timestamp: i64 },

    PlaybackFinished {
        target: String,
        #[serde(flatten)]
        outcome: PlaybackOutcome,
        timestamp: i64,
    },

    Info { message: String, timestamp: i64 },

    /// One entry of the channel catalog (`gpanel channels`)
    Channel {
        #[serde(flatten)]
        channel: Channel,
        timestamp: i64,
    },

    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }
        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    pub fn channel(channel: &Channel) -> Self {
        Self::Channel {
            channel: channel.clone(),
            timestamp: Self::now(),
        }
    }

    pub fn error(message: impl Into<String>, fatal: bool) -> Self {
        Self::Error {
            message: message.into(),
            fatal,
            timestamp: Self::now(),
        }
    }
}

impl From<&PanelEvent> for HeadlessEvent {
    fn from(event: &PanelEvent) -> Self {
        let timestamp = Self::now();
        match event.clone() {
            PanelEvent::EngineOutput { stream, line } => Self::EngineOutput {
                stream,
                line,
                timestamp,
            },
            PanelEvent::EngineStarted { run } => Self::EngineStarted { run, timestamp },
            PanelEvent::DocumentLoaded { path } => Self::DocumentLoaded { path, timestamp },
            PanelEvent::TuningStarted { channel } => Self::TuningStarted { channel, timestamp },
            PanelEvent::ConfirmKeepWaiting { channel } => {
                Self::ConfirmKeepWaiting { channel, timestamp }
            }
            PanelEvent::TuneFinished { channel, outcome } => Self::TuneFinished {
                channel,
                outcome,
                timestamp,
            },
            PanelEvent::ScanStarted => Self::ScanStarted { timestamp },
            PanelEvent::ScanProgress { percent } => Self::ScanProgress { percent, timestamp },
            PanelEvent::ChannelFound { name } => Self::ChannelFound { name, timestamp },
            PanelEvent::ScanFinished { outcome } => Self::ScanFinished { outcome, timestamp },
            PanelEvent::PlaybackStarted { target } => Self::PlaybackStarted { target, timestamp },
            PanelEvent::PlaybackFinished { target, outcome } => Self::PlaybackFinished {
                target,
                outcome,
                timestamp,
            },
            PanelEvent::Info { message } => Self::Info { message, timestamp },
        }
    }
}
