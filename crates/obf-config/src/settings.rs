//! Runtime settings and the settings file format.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Field list used when a trigger does not name one.
pub const DEFAULT_FIELDS: &[&str] = &["name", "email"];

/// Prefix under which redacted copies are written.
pub const DEFAULT_OUTPUT_PREFIX: &str = "obfuscated/";

/// Deployment mode. Only affects the overwrite default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    /// Existing outputs are overwritten unless told otherwise.
    Development,
    /// Existing outputs are kept unless told otherwise.
    #[default]
    Production,
}

impl RuntimeMode {
    /// Interpret a deployment environment name such as `OBF_ENV`.
    ///
    /// Only development names switch to development; every other value,
    /// including ones this crate has never heard of, is production.
    pub fn from_env_value(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "dev" | "development" | "local" => RuntimeMode::Development,
            _ => RuntimeMode::Production,
        }
    }
}

impl std::str::FromStr for RuntimeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" | "development" | "local" => Ok(RuntimeMode::Development),
            "prod" | "production" | "staging" => Ok(RuntimeMode::Production),
            _ => Err(format!("unknown runtime mode: {}", s)),
        }
    }
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeMode::Development => write!(f, "development"),
            RuntimeMode::Production => write!(f, "production"),
        }
    }
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub mode: RuntimeMode,
    /// Environment-level overwrite flag. Wins over the mode default.
    pub force_overwrite: Option<bool>,
    pub default_fields: Vec<String>,
    pub output_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            mode: RuntimeMode::default(),
            force_overwrite: None,
            default_fields: DEFAULT_FIELDS.iter().map(|s| s.to_string()).collect(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
        }
    }
}

impl Settings {
    /// Whether an existing target may be replaced when a request does not say.
    pub fn default_overwrite(&self) -> bool {
        self.force_overwrite
            .unwrap_or(self.mode == RuntimeMode::Development)
    }
}

/// On-disk settings. Every key is optional; absent keys fall through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub mode: Option<RuntimeMode>,
    #[serde(default)]
    pub force_overwrite: Option<bool>,
    #[serde(default)]
    pub default_fields: Option<Vec<String>>,
    #[serde(default)]
    pub output_prefix: Option<String>,
}

impl SettingsFile {
    /// Load a settings file from JSON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
