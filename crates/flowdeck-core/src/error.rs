//! Error types for flowdeck operations.
//!
//! This module defines [`FlowdeckError`], the error enum shared by the core
//! crate and surfaced by the binary. Feed and usage errors live in their own
//! crates and convert into user-facing messages at the UI boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`FlowdeckError`].
pub type Result<T> = std::result::Result<T, FlowdeckError>;

/// Error type for core flowdeck operations.
///
/// Missing configuration is never an error: it is logged and replaced with a
/// fallback value. Errors here are for things that actually stop an
/// operation (unreadable files, malformed YAML, terminal failures).
#[derive(Debug, Error)]
pub enum FlowdeckError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file is invalid YAML
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Configuration value could not be interpreted
    #[error("Invalid value for {field}: {value}")]
    ConfigValue { field: String, value: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Parsing Errors
    // =========================================================================
    /// JSON parsing error
    #[error("JSON parse error in {context}: {message}")]
    JsonParse {
        context: String,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Persisted client state could not be read or written
    #[error("Client state error at {path}: {message}")]
    ClientState { path: PathBuf, message: String },

    // =========================================================================
    // TUI Errors
    // =========================================================================
    /// Terminal initialization failed
    #[error("Terminal initialization failed: {message}")]
    TerminalInit { message: String },

    /// Terminal restore failed
    #[error("Failed to restore terminal: {message}")]
    TerminalRestore { message: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (bug in flowdeck)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FlowdeckError {
    /// Create an I/O error
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a JSON parse error
    pub fn json_parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonParse {
            context: context.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a ConfigInvalid error
    pub fn config_invalid(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error is fatal (should exit application)
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TerminalInit { .. } | Self::Internal { .. })
    }

    /// Returns true if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigInvalid { .. } | Self::ConfigValue { .. })
    }

    /// Returns actionable guidance for the user
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => {
                Some("Check YAML syntax in ~/.flowdeck/config.yaml or pass --config")
            }
            Self::ConfigValue { .. } => Some("Check the FLOWDECK_* environment variables"),
            Self::ClientState { .. } => {
                Some("Delete ~/.flowdeck/client_state.json to reset saved preferences")
            }
            Self::TerminalInit { .. } => Some("Try running in a different terminal"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_invalid_error() {
        let err = FlowdeckError::config_invalid("/home/user/.flowdeck/config.yaml", "bad indent");
        assert!(err.to_string().contains("Invalid configuration"));
        assert!(err.to_string().contains("bad indent"));
        assert!(err.is_config_error());
        assert!(!err.is_fatal());
        assert!(err.guidance().is_some());
    }

    #[test]
    fn test_error_classification() {
        assert!(FlowdeckError::internal("bug").is_fatal());
        assert!(
            FlowdeckError::TerminalInit {
                message: "no tty".into()
            }
            .is_fatal()
        );
        assert!(
            !FlowdeckError::ClientState {
                path: "/tmp/state.json".into(),
                message: "denied".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_json_parse_keeps_message() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = FlowdeckError::json_parse("client state", source);
        assert!(err.to_string().starts_with("JSON parse error in client state"));
    }

    #[test]
    fn test_error_guidance() {
        let err = FlowdeckError::TerminalInit {
            message: "raw mode".into(),
        };
        assert_eq!(err.guidance(), Some("Try running in a different terminal"));
        assert_eq!(FlowdeckError::internal("x").guidance(), None);
    }
}
