//! `kwento.json` loading.

use std::path::{Path, PathBuf};

use kwento_activity::ActivityTiming;
use kwento_client::ClientConfig;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "kwento.json";

/// Default location of the stored credentials.
fn default_credentials_file() -> String {
    ".kwento/credentials.json".to_string()
}

/// Top-level CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// API client settings.
    #[serde(default)]
    pub api: ClientConfig,

    /// Activity reveal windows.
    #[serde(default)]
    pub timing: ActivityTiming,

    /// JSON file holding the stored auth tokens.
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ClientConfig::default(),
            timing: ActivityTiming::default(),
            credentials_file: default_credentials_file(),
        }
    }
}

impl Config {
    /// Loads `kwento.json` from the current working directory, or defaults.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            CliError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `kwento.json` from `dir`, or defaults.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `CliError::ConfigParseError` if the file cannot be read or is
    /// not valid JSON, and `CliError::ConfigValidationError` if a value is
    /// out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(CliError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| CliError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Path of the credentials file.
    #[must_use]
    pub fn credentials_path(&self) -> PathBuf {
        PathBuf::from(&self.credentials_file)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;

        if let Err((field, value)) = self.timing.validate() {
            return Err(CliError::config_validation(
                format!("timing.{field} is {value}ms; the maximum is 60000ms"),
                format!("Lower timing.{field} in your kwento.json"),
            ));
        }

        if self.credentials_file.trim().is_empty() {
            return Err(CliError::config_validation(
                "credentialsFile must not be empty",
                "Provide a path such as .kwento/credentials.json in your kwento.json",
            ));
        }

        Ok(())
    }
}
