//! Error types for the validation service.

use std::path::PathBuf;

use thiserror::Error;
use vocab_loader::{LoadError, StoreError};

/// A validation query could not be executed.
///
/// "No match" is never an error; it is reported through the result's
/// flags and sets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The store rejected a query.
    #[error("Vocabulary query failed: {0}")]
    Store(#[from] StoreError),
}

/// Errors from [`initialize`](crate::initialize).
#[derive(Error, Debug)]
pub enum StartupError {
    /// A configured source root exists but cannot be used.
    #[error("Invalid source directory: {0}")]
    Source(#[from] LoadError),

    /// The background initializer stopped before finishing.
    #[error("Startup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors from starting a watchdog.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The file-system watcher could not be created or attached.
    #[error("Failed to watch {path}: {source}")]
    Notify {
        /// Root that was to be watched.
        path: PathBuf,
        /// Underlying watcher error.
        #[source]
        source: notify::Error,
    },
}

/// Invalid service configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed.
    #[error("Invalid value '{value}' for {variable}: {reason}")]
    InvalidValue {
        /// Variable name.
        variable: &'static str,
        /// Raw value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}
