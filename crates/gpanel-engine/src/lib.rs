//! # gpanel-engine - Ginga Engine Process Management
//!
//! Launches the Ginga engine as a child process, speaks its line protocol
//! and builds its command lines.
//!
//! Depends on [`gpanel_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Process Management
//! - [`ProcessSupervisor`] - Owns at most one engine process; start/write/stop
//! - [`EngineControl`] - Trait seam the workflows drive
//! - [`EngineProcess`] - One spawned engine with stdout/stderr readers
//!
//! ### Protocol Parsing
//! - [`parse_line()`] - Classify one output line as log text or a command
//! - [`is_stream_started()`], [`parse_percent()`] - Payload helpers
//!
//! ### Command Building
//! - [`LaunchContext`] - Settings snapshot taken when an action starts
//! - [`play_document()`], [`tune_channel()`], [`scan_channels()`],
//!   [`passive_device()`], [`active_device()`] - Engine argument lists
//! - [`next_device_port()`] - Active-device port counter
//!
//! ### Platform
//! - [`platform_defaults()`] - Environment overrides per OS
//! - [`resolve_program()`] - Locate the engine binary

pub mod commands;
pub mod environment;
pub mod process;
pub mod protocol;
pub mod supervisor;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use commands::{
    active_device, next_device_port, passive_device, play_document, scan_channels,
    split_parameters, tune_channel, DevicePort, DocumentKind, EngineCommand, LaunchContext,
};
pub use environment::{platform_defaults, resolve_program, GINGA_LIBRARY_PATH};
pub use process::EngineProcess;
pub use protocol::{is_stream_started, parse_line, parse_percent};
pub use supervisor::{
    EngineControl, ProcessLifecycle, ProcessSupervisor, SupervisorConfig, DEFAULT_QUIT_TOKEN,
    DEFAULT_STOP_GRACE,
};
