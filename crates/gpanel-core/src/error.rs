//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Engine Process Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Error while opening Ginga: {path} not found. Check the binary path.")]
    EngineNotFound { path: PathBuf },

    #[error("Failed to launch the Ginga engine: {reason}")]
    ProcessSpawn { reason: String },

    #[error("No engine process is running")]
    NotRunning,

    #[error("Engine input stream is closed")]
    StdinClosed,

    // ─────────────────────────────────────────────────────────────
    // Launch Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Unsupported document (expected .ncl or .ts): {path}")]
    UnsupportedDocument { path: PathBuf },

    #[error("Invalid screen geometry '{value}', expected WIDTHxHEIGHT")]
    InvalidGeometry { value: String },

    #[error("Only one passive device client is allowed per host.")]
    PassiveAlreadyRunning,

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn process_spawn(reason: impl Into<String>) -> Self {
        Self::ProcessSpawn {
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    pub fn unsupported_document(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedDocument { path: path.into() }
    }

    /// Failed to launch the engine (binary missing or not executable)
    pub fn is_spawn_error(&self) -> bool {
        matches!(self, Error::EngineNotFound { .. } | Error::ProcessSpawn { .. })
    }

    /// Check if this error ends the current workflow
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::EngineNotFound { .. }
                | Error::ProcessSpawn { .. }
                | Error::UnsupportedDocument { .. }
                | Error::InvalidGeometry { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
