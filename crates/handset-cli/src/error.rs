//! Error types for the CLI

use handset::{DeviceError, StepError};
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Device or session error
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Step registry error
    #[error("Step error: {0}")]
    Step(#[from] StepError),

    /// Script has steps that do not resolve
    #[error("{count} step(s) do not match exactly one definition")]
    InvalidScript {
        /// Number of unresolved steps
        count: usize,
    },

    /// At least one scenario failed
    #[error("{failed} of {total} scenario(s) failed")]
    ScenarioFailed {
        /// Failed scenarios
        failed: usize,
        /// Scenarios run
        total: usize,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
