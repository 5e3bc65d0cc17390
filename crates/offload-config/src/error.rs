//! Error types for destination configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading or validating a destination.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO failure reading a configuration file.
    #[error("config io failure")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The configuration file was not valid JSON.
    #[error("config json failure")]
    Json {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// `default_file_action` carried a value outside `transfer`/`copy`.
    #[error("invalid default file action")]
    InvalidFileAction {
        /// The rejected value.
        value: String,
    },
}
