//! Log level and format resolution for the `obf` binary.

use serde::{Deserialize, Serialize};

/// Where log lines go and how they look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Console lines on stderr.
    #[default]
    Human,
    /// One JSON object per line on stderr.
    Jsonl,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s.trim().to_ascii_lowercase().as_str() {
            "human" | "console" | "pretty" => LogFormat::Human,
            "jsonl" | "json" | "structured" => LogFormat::Jsonl,
            other => return Err(format!("unknown log format '{other}' (expected human or jsonl)")),
        };
        Ok(format)
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verbosity, ordered from chattiest to silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    const NAMES: [(&'static str, LogLevel); 9] = [
        ("trace", LogLevel::Trace),
        ("debug", LogLevel::Debug),
        ("info", LogLevel::Info),
        ("warn", LogLevel::Warn),
        ("warning", LogLevel::Warn),
        ("error", LogLevel::Error),
        ("off", LogLevel::Off),
        ("none", LogLevel::Off),
        ("quiet", LogLevel::Off),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    /// The most verbose level named in a `RUST_LOG`-style directive list,
    /// e.g. `obf_core=debug,hyper=warn` yields `Debug`.
    fn from_directives(directives: &str) -> Option<LogLevel> {
        directives
            .split(',')
            .filter_map(|directive| {
                let level = directive.rsplit('=').next()?;
                level.trim().parse::<LogLevel>().ok()
            })
            .min()
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, level)| *level)
            .ok_or_else(|| format!("unknown log level '{s}'"))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Environment variable for the obfuscator's own level.
pub const ENV_LOG: &str = "OBF_LOG";
/// Environment variable for the log format.
pub const ENV_LOG_FORMAT: &str = "OBF_LOG_FORMAT";

/// Resolved logging setup for the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Timestamps on human lines.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// CLI flags over `OBF_LOG` over `RUST_LOG` over defaults.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable lookup.
    pub fn from_lookup<F>(env: F, cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_level = match env(ENV_LOG) {
            Some(val) => val.parse().ok(),
            None => env("RUST_LOG").and_then(|val| LogLevel::from_directives(&val)),
        };
        let env_format = env(ENV_LOG_FORMAT).and_then(|val| val.parse().ok());

        let defaults = LogConfig::default();
        LogConfig {
            level: cli_level.or(env_level).unwrap_or(defaults.level),
            format: cli_format.or(env_format).unwrap_or(defaults.format),
            timestamps: defaults.timestamps,
        }
    }
}
