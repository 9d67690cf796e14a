//! Host-facing error types.
//!
//! Failures inside future chains never surface here; they become rejection
//! reasons. These errors cover what the host itself does: loading
//! configuration and driving the event loop.

use core_types::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a [`RuntimeConfig`](crate::RuntimeConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid JSON for the expected shape
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The config parsed but holds an unusable value
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors surfaced by the [`EventLoop`](crate::EventLoop).
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A macrotask raised a value instead of completing
    #[error("task raised: {0}")]
    TaskFailed(Value),

    /// The runtime could not be configured
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for event loop operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;
