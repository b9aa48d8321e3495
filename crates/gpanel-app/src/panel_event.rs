//! Notifications from the panel to its front end

use std::path::PathBuf;

use gpanel_core::{Channel, OutputStream, PlaybackOutcome, RunId, ScanOutcome, TuneOutcome};

/// What the front end should show or ask.
///
/// Each failure is reported exactly once, through the `*Finished` event that
/// ends its workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// A line of engine output from the live run
    EngineOutput { stream: OutputStream, line: String },

    /// Engine process launched
    EngineStarted { run: RunId },

    DocumentLoaded { path: PathBuf },

    // ─────────────────────────────────────────────────────────
    // Tuning
    // ─────────────────────────────────────────────────────────
    TuningStarted { channel: Channel },

    /// The tuning deadline passed; answer with `resolve_timeout`
    ConfirmKeepWaiting { channel: Channel },

    TuneFinished { channel: Channel, outcome: TuneOutcome },

    // ─────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────
    ScanStarted,

    ScanProgress { percent: u8 },

    ChannelFound { name: String },

    ScanFinished { outcome: ScanOutcome },

    // ─────────────────────────────────────────────────────────
    // Playback (documents, device roles, tuned channels)
    // ─────────────────────────────────────────────────────────
    PlaybackStarted { target: String },

    PlaybackFinished { target: String, outcome: PlaybackOutcome },

    /// Informational notice, e.g. nothing to play
    Info { message: String },
}

impl PanelEvent {
    /// True for the events that end a workflow
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PanelEvent::TuneFinished { .. }
                | PanelEvent::ScanFinished { .. }
                | PanelEvent::PlaybackFinished { .. }
        )
    }

    pub fn info(message: impl Into<String>) -> Self {
        PanelEvent::Info {
            message: message.into(),
        }
    }
}
