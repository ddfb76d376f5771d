//! Error types for the `kwento` binary.

use std::path::PathBuf;

use kwento_activity::{ActivityError, ActivityKind};
use kwento_client::{ClientError, ConfigError};

/// A specialized `Result` type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors surfaced to the user by the CLI.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your kwento.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Script Errors
    // ========================================================================
    /// The activity script does not exist.
    #[error("Activity script not found: '{path}'\n\nSuggestion: Check the SCRIPT argument")]
    ScriptNotFound {
        /// Path that was given.
        path: PathBuf,
    },

    /// The activity script is not valid JSON or has an unknown shape.
    #[error("Invalid activity script '{path}': {message}")]
    ScriptParseError {
        /// Path to the script.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// An action does not apply to the scripted activity.
    #[error("Action #{index} ({action}) does not apply to a {kind} activity")]
    UnsupportedAction {
        /// Zero-based action index.
        index: usize,
        /// Action name.
        action: &'static str,
        /// The scripted activity kind.
        kind: ActivityKind,
    },

    /// The engine rejected an action.
    #[error("Action #{index} ({action}) failed: {source}")]
    ActionFailed {
        /// Zero-based action index.
        index: usize,
        /// Action name.
        action: &'static str,
        /// What the engine reported.
        #[source]
        source: ActivityError,
    },

    /// The script ran out of actions before the attempt completed.
    #[error("Script ended before the activity completed\n\nSuggestion: End the script with a 'check' action, or 'submit' for the last question")]
    Unfinished,

    // ========================================================================
    // API Errors
    // ========================================================================
    /// An API call failed.
    #[error("API request failed: {0}")]
    Client(#[from] ClientError),
}

impl CliError {
    /// Creates a new `ConfigParseError`.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError`.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `ScriptParseError`.
    #[must_use]
    pub fn script_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ScriptParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::ConfigValidationError {
            message: error.message,
            suggestion: error.suggestion,
        }
    }
}
