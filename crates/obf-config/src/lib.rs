//! Field obfuscator runtime settings.
//!
//! This crate provides:
//! - Typed settings (mode, overwrite flag, default fields, output prefix)
//! - Settings resolution (CLI → env → settings file → defaults)
//! - Semantic validation
//!
//! The resolved overwrite default is handed to the pipeline once at startup;
//! nothing downstream reads the environment.

pub mod error;
pub mod resolve;
pub mod settings;
pub mod validate;

pub use error::ConfigError;
pub use resolve::{resolve_settings, CliOverrides, ConfigSource, ResolvedSettings};
pub use settings::{RuntimeMode, Settings, SettingsFile};
pub use validate::{ValidationError, ValidationResult};
