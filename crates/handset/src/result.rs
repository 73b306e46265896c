//! Result and error types for Handset.

use thiserror::Error;

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors raised by device operations.
///
/// Any of these returned from an assert or unqualified step is a hard
/// failure and stops the scenario. Verify steps swallow them and report
/// `false` instead.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The driver rejected or failed a command
    #[error("Device command {command} failed: {message}")]
    Driver {
        /// Command that failed
        command: String,
        /// Error message
        message: String,
    },

    /// The device does not support the command
    #[error("Device does not support {command}")]
    Unsupported {
        /// Unsupported command
        command: String,
    },

    /// Coordinates did not parse as `lat,long`
    #[error("Invalid coordinates '{value}': {reason}")]
    InvalidCoordinates {
        /// Raw input
        value: String,
        /// Why parsing failed
        reason: String,
    },

    /// Step argument could not be converted
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// "Allow mock locations" is off on the device
    #[error("Mock locations are not enabled on the device")]
    MockLocationDisabled,

    /// Address could not be geocoded
    #[error("Could not geocode address '{address}'")]
    Geocoding {
        /// Address that failed
        address: String,
    },

    /// No virtual keyboard is shown
    #[error("No keyboard is displayed")]
    NoKeyboard,

    /// Screenshot capture or storage error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Assertion failed; aborts the scenario
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Session could not be created or is gone
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// HTTP transport error
    #[cfg(feature = "remote")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl DeviceError {
    /// Create a driver error for a command
    #[must_use]
    pub fn driver(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Driver {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
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

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this is an assertion failure
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::AssertionFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_message() {
        let err = DeviceError::driver("mobile:device:rotate", "orientation locked");
        let msg = err.to_string();
        assert!(msg.contains("mobile:device:rotate"));
        assert!(msg.contains("orientation locked"));
    }

    #[test]
    fn test_assertion_error() {
        let err = DeviceError::assertion("timezone mismatch");
        assert!(err.is_assertion());
        assert!(err.to_string().starts_with("Assertion failed"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DeviceError = io.into();
        assert!(matches!(err, DeviceError::Io(_)));
        assert!(!err.is_assertion());
    }
}
