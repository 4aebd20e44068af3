//! Error types for configuration loading and the streaming worker.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for the config schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but violates a semantic constraint.
    #[error(transparent)]
    Invalid(#[from] tilestream_wfc::ConfigError),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures of the threaded scheduler.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The OS refused to start the worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker panicked; its tilemap is lost.
    #[error("worker thread panicked")]
    WorkerPanicked,

    /// Configuration rejected before starting.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
