//! Protocol-driven workflows
//!
//! Each workflow borrows the engine for the duration of a call and returns
//! the [`PanelEvent`](crate::PanelEvent)s its transition produced. Terminal
//! states ignore everything that follows, so each outcome is reported once.

pub mod playback;
pub mod scan;
pub mod tuning;

pub use playback::PlaybackWorkflow;
pub use scan::ScanWorkflow;
pub use tuning::{TuningWorkflow, WEAK_SIGNAL_MESSAGE};
