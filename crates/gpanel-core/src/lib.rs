//! # gpanel-core - Core Domain Types
//!
//! Foundation crate for Ginga Panel. Provides domain types, error handling,
//! engine/protocol event definitions and workflow outcomes.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`Channel`] - Tunable broadcast channel, identified by frequency
//! - [`Geometry`] - Screen size passed as `--vmode WxH`
//! - [`DeviceRole`] - Base, passive or active device participation
//! - [`OutputStream`] - Stdout or stderr
//!
//! ### Events (`events`)
//! - [`ProtocolEvent`] - One parsed line of engine output
//! - [`EngineEvent`] - Output/exit/spawn-failure events from the engine process
//! - [`RunId`] - Identifies one launch of the engine
//!
//! ### Workflows (`workflow`)
//! - [`WorkflowState`], [`Deadline`] - Shared workflow lifecycle
//! - [`TuneOutcome`], [`ScanOutcome`], [`PlaybackOutcome`] - Terminal results
//! - [`ScanProgress`] - Scan percent and last channel found
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! ```rust
//! use gpanel_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod types;
pub mod workflow;

/// Prelude for common imports used throughout all Ginga Panel crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use error::{Error, Result, ResultExt};
pub use events::{EngineEvent, ExitKind, ProtocolEvent, ProtocolStatus, RunId};
pub use types::{Channel, DeviceRole, Geometry, OutputStream};
pub use workflow::{
    Deadline, PlaybackOutcome, ScanOutcome, ScanProgress, TuneOutcome, WorkflowState,
};
