//! Settings validation errors and semantic validation.

use thiserror::Error;

use crate::settings::Settings;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Settings validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required value: {0}")]
    MissingValue(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::MissingValue(_) => 41,
            ValidationError::InvalidValue { .. } => 42,
        }
    }
}

/// Validate resolved settings semantically.
pub fn validate_settings(settings: &Settings) -> ValidationResult<()> {
    if settings.default_fields.is_empty() {
        return Err(ValidationError::MissingValue("default_fields".to_string()));
    }
    if let Some(idx) = settings
        .default_fields
        .iter()
        .position(|f| f.trim().is_empty())
    {
        return Err(ValidationError::InvalidValue {
            field: format!("default_fields[{}]", idx),
            message: "field names must not be blank".to_string(),
        });
    }

    validate_output_prefix(&settings.output_prefix)
}

fn validate_output_prefix(prefix: &str) -> ValidationResult<()> {
    if prefix.is_empty() {
        return Err(ValidationError::MissingValue("output_prefix".to_string()));
    }
    if prefix.starts_with('/') {
        return Err(ValidationError::InvalidValue {
            field: "output_prefix".to_string(),
            message: format!("must be relative to the container, got '{}'", prefix),
        });
    }
    if !prefix.ends_with('/') {
        return Err(ValidationError::InvalidValue {
            field: "output_prefix".to_string(),
            message: format!("must end with '/', got '{}'", prefix),
        });
    }
    Ok(())
}
