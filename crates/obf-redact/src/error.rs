//! Error types for the redaction engines.

use thiserror::Error;

use obf_common::request::KEY_FIELDS;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur during detection, decoding or redaction.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// The object suffix maps to no supported format.
    #[error("unsupported file format '{suffix}'")]
    UnsupportedFormat { suffix: String },

    /// Content belongs to a different format than its suffix claims.
    #[error("format mismatch: {0}")]
    FormatMismatch(String),

    /// Content does not parse as the detected format.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// JSON parsed, but its top-level shape is not an object or list of objects.
    #[error("unsupported JSON structure: {0}")]
    UnsupportedStructure(String),

    /// Text could not be decoded with the chosen encoding.
    #[error("could not decode payload as {encoding}: {message}")]
    Decode { encoding: String, message: String },

    /// A requested field name is not a string.
    #[error("field names must be strings, got {0}")]
    InvalidFieldType(String),

    /// No field names were requested.
    #[error("no field names requested")]
    EmptyFieldList,

    /// None of the requested fields occur anywhere in the payload.
    #[error("no matching fields among [{}]", .requested.join(", "))]
    NoMatchingFields { requested: Vec<String> },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl From<RedactionError> for obf_common::Error {
    fn from(err: RedactionError) -> Self {
        use obf_common::Error;
        match err {
            RedactionError::UnsupportedFormat { suffix } => Error::UnsupportedFormat { suffix },
            RedactionError::Decode { encoding, message } => Error::Decode { encoding, message },
            RedactionError::InvalidFieldType(_) => Error::InvalidFieldType {
                key: KEY_FIELDS.to_string(),
                expected: "a list of strings".to_string(),
            },
            RedactionError::EmptyFieldList => Error::EmptyValue {
                key: KEY_FIELDS.to_string(),
            },
            RedactionError::NoMatchingFields { requested } => Error::NoMatchingFields { requested },
            other @ (RedactionError::FormatMismatch(_)
            | RedactionError::InvalidPayload(_)
            | RedactionError::UnsupportedStructure(_)
            | RedactionError::Csv(_)
            | RedactionError::Json(_)
            | RedactionError::Parquet(_)
            | RedactionError::Arrow(_)) => Error::InvalidPayload(other.to_string()),
        }
    }
}
