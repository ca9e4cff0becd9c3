//! Configuration loading errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::resolve::ConfigSource;
use crate::validate::ValidationError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read settings file {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("cannot parse settings file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("settings file {} does not exist", .0.display())]
    MissingFile(PathBuf),

    #[error("invalid value for {key} (from {source_kind}): {message}")]
    InvalidValue {
        key: String,
        source_kind: ConfigSource,
        message: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<ConfigError> for obf_common::Error {
    fn from(err: ConfigError) -> Self {
        obf_common::Error::Config(err.to_string())
    }
}
