//! Settings resolution.
//!
//! Resolution order per key: CLI arguments → environment variables → settings file → defaults.
//! The settings file itself is located by: CLI path → `OBF_CONFIG` → XDG config directory.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::settings::{RuntimeMode, Settings, SettingsFile};
use crate::validate::validate_settings;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Read from a settings file.
    ConfigFile,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::ConfigFile => write!(f, "settings file"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_MODE: &str = "OBF_ENV";
pub const ENV_FORCE_OVERWRITE: &str = "OBF_FORCE_OVERWRITE";
pub const ENV_DEFAULT_FIELDS: &str = "OBF_DEFAULT_FIELDS";
pub const ENV_OUTPUT_PREFIX: &str = "OBF_OUTPUT_PREFIX";
pub const ENV_CONFIG_PATH: &str = "OBF_CONFIG";

/// Standard settings file name.
pub const SETTINGS_FILENAME: &str = "settings.json";

/// Application name for XDG directories.
const APP_NAME: &str = "field-obfuscator";

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub mode: Option<RuntimeMode>,
    pub force_overwrite: Option<bool>,
    pub default_fields: Option<Vec<String>>,
}

/// Per-key provenance of the resolved settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingSources {
    pub mode: ConfigSource,
    pub force_overwrite: ConfigSource,
    pub default_fields: ConfigSource,
    pub output_prefix: ConfigSource,
}

/// Settings together with where each value came from.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSettings {
    pub settings: Settings,
    pub sources: SettingSources,
    /// Settings file that was read, if any.
    pub config_file: Option<PathBuf>,
}

/// Resolve settings from the process environment.
pub fn resolve_settings(cli: &CliOverrides) -> Result<ResolvedSettings, ConfigError> {
    resolve_settings_with(cli, |key| std::env::var(key).ok(), xdg_config_dir())
}

/// Resolve settings with an explicit environment lookup and XDG directory.
pub fn resolve_settings_with<F>(
    cli: &CliOverrides,
    env: F,
    xdg_dir: Option<PathBuf>,
) -> Result<ResolvedSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config_file = locate_settings_file(cli.config_path.as_deref(), &env, xdg_dir)?;
    let file = match &config_file {
        Some(path) => SettingsFile::from_file(path)?,
        None => SettingsFile::default(),
    };

    let mut settings = Settings::default();
    let mut sources = SettingSources::default();

    // mode
    if let Some(mode) = cli.mode {
        settings.mode = mode;
        sources.mode = ConfigSource::CliArgument;
    } else if let Some(raw) = env(ENV_MODE) {
        settings.mode = RuntimeMode::from_env_value(&raw);
        sources.mode = ConfigSource::Environment;
    } else if let Some(mode) = file.mode {
        settings.mode = mode;
        sources.mode = ConfigSource::ConfigFile;
    }

    // force_overwrite
    if let Some(force) = cli.force_overwrite {
        settings.force_overwrite = Some(force);
        sources.force_overwrite = ConfigSource::CliArgument;
    } else if let Some(raw) = env(ENV_FORCE_OVERWRITE) {
        settings.force_overwrite =
            Some(parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: ENV_FORCE_OVERWRITE.to_string(),
                source_kind: ConfigSource::Environment,
                message: format!("expected true/false, got '{}'", raw),
            })?);
        sources.force_overwrite = ConfigSource::Environment;
    } else if let Some(force) = file.force_overwrite {
        settings.force_overwrite = Some(force);
        sources.force_overwrite = ConfigSource::ConfigFile;
    }

    // default_fields
    if let Some(fields) = &cli.default_fields {
        settings.default_fields = fields.clone();
        sources.default_fields = ConfigSource::CliArgument;
    } else if let Some(raw) = env(ENV_DEFAULT_FIELDS) {
        settings.default_fields = split_field_list(&raw);
        sources.default_fields = ConfigSource::Environment;
    } else if let Some(fields) = file.default_fields {
        settings.default_fields = fields;
        sources.default_fields = ConfigSource::ConfigFile;
    }

    // output_prefix
    if let Some(prefix) = env(ENV_OUTPUT_PREFIX) {
        settings.output_prefix = prefix;
        sources.output_prefix = ConfigSource::Environment;
    } else if let Some(prefix) = file.output_prefix {
        settings.output_prefix = prefix;
        sources.output_prefix = ConfigSource::ConfigFile;
    }

    validate_settings(&settings)?;

    Ok(ResolvedSettings {
        settings,
        sources,
        config_file,
    })
}

/// Find the settings file to read.
///
/// Explicit paths (CLI or `OBF_CONFIG`) must exist; the XDG location is optional.
fn locate_settings_file<F>(
    cli_path: Option<&Path>,
    env: &F,
    xdg_dir: Option<PathBuf>,
) -> Result<Option<PathBuf>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Some(env_path) = env(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if !path.exists() {
            return Err(ConfigError::MissingFile(path));
        }
        return Ok(Some(path));
    }

    if let Some(dir) = xdg_dir {
        let path = dir.join(SETTINGS_FILENAME);
        if path.is_file() {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

/// Get the XDG config directory for the obfuscator.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated field list, dropping blanks.
pub fn split_field_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::ConfigFile), "settings file");
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn test_builtin_defaults() {
        let resolved = resolve_settings_with(&CliOverrides::default(), env_from(&[]), None).unwrap();
        assert_eq!(resolved.settings, Settings::default());
        assert_eq!(resolved.sources, SettingSources::default());
        assert!(resolved.config_file.is_none());
        assert!(!resolved.settings.default_overwrite());
    }

    #[test]
    fn test_env_values() {
        let env = env_from(&[
            (ENV_MODE, "dev"),
            (ENV_DEFAULT_FIELDS, "name, email ,phone,,"),
        ]);
        let resolved = resolve_settings_with(&CliOverrides::default(), env, None).unwrap();
        assert_eq!(resolved.settings.mode, RuntimeMode::Development);
        assert_eq!(resolved.settings.default_fields, vec!["name", "email", "phone"]);
        assert_eq!(resolved.sources.mode, ConfigSource::Environment);
        assert!(resolved.settings.default_overwrite());
    }

    #[test]
    fn test_cli_beats_env() {
        let env = env_from(&[(ENV_MODE, "dev"), (ENV_FORCE_OVERWRITE, "true")]);
        let cli = CliOverrides {
            mode: Some(RuntimeMode::Production),
            force_overwrite: Some(false),
            ..CliOverrides::default()
        };
        let resolved = resolve_settings_with(&cli, env, None).unwrap();
        assert_eq!(resolved.settings.mode, RuntimeMode::Production);
        assert_eq!(resolved.settings.force_overwrite, Some(false));
        assert_eq!(resolved.sources.force_overwrite, ConfigSource::CliArgument);
    }

    #[test]
    fn test_invalid_env_values() {
        let err = resolve_settings_with(
            &CliOverrides::default(),
            env_from(&[(ENV_FORCE_OVERWRITE, "maybe")]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_FORCE_OVERWRITE));

        let resolved = resolve_settings_with(
            &CliOverrides::default(),
            env_from(&[(ENV_MODE, "qa")]),
            None,
        )
        .unwrap();
        assert_eq!(resolved.settings.mode, RuntimeMode::Production);
    }

    #[test]
    fn test_empty_field_list_from_env_fails_validation() {
        let err = resolve_settings_with(
            &CliOverrides::default(),
            env_from(&[(ENV_DEFAULT_FIELDS, " , ")]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_missing_explicit_file() {
        let cli = CliOverrides {
            config_path: Some(PathBuf::from("/nonexistent/obf/settings.json")),
            ..CliOverrides::default()
        };
        let err = resolve_settings_with(&cli, env_from(&[]), None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(_)));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("perhaps"), None);
    }
}
