//! # gpanel-app - Panel orchestration for Ginga Panel
//!
//! Drives the Ginga engine through its workflows: document playback,
//! channel tuning with the weak-signal prompt, channel scans and the
//! multi-device roles. Also owns settings, persisted panel state, the
//! developer log and the passive-device lock.
//!
//! ## Public API
//!
//! - [`Panel`] - Controller; one engine, one workflow at a time
//! - [`PanelEvent`] - Notifications for the front end
//! - [`TuningWorkflow`], [`ScanWorkflow`], [`PlaybackWorkflow`] - Protocol-driven state machines
//! - [`Settings`], [`PanelState`] - `config.toml` and `state.toml`
//! - [`ChannelCatalog`], [`ChannelList`] - Next/previous channel lookups
//! - [`DeveloperLog`] - Bounded buffer of raw engine output

pub mod channels;
pub mod cleanup;
pub mod config;
pub mod devlog;
pub mod guard;
pub mod panel;
pub mod panel_event;
pub mod workflow;

// Re-export primary types
pub use channels::{ChannelCatalog, ChannelList};
pub use config::{PanelState, Settings};
pub use devlog::{DevLogEntry, DeveloperLog};
pub use guard::PassiveGuard;
pub use panel::{Panel, PanelPaths, NOTHING_TO_PLAY};
pub use panel_event::PanelEvent;
pub use workflow::{PlaybackWorkflow, ScanWorkflow, TuningWorkflow, WEAK_SIGNAL_MESSAGE};
