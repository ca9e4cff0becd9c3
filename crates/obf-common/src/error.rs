//! Error types for the field obfuscator.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - A caller/operator split used by the result surface
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Source Object Not Found
//!   Reason: source object 'raw/users.csv' does not exist in container 'intake'
//!   Fix: Check the key and bucket in the request; the object may not have been uploaded yet.
//! ```
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON through [`ErrorReport`]:
//! ```json
//! {
//!   "code": 20,
//!   "category": "source",
//!   "headline": "Source Object Not Found",
//!   "message": "source object 'raw/users.csv' does not exist in container 'intake'",
//!   "context": { "container": "intake", "path": "raw/users.csv" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type alias for obfuscator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The request itself is malformed or incomplete.
    Request,
    /// The source object could not be located.
    Source,
    /// The payload bytes do not fit the detected format or field list.
    Payload,
    /// Runtime settings are unreadable or inconsistent.
    Config,
    /// The storage collaborator failed.
    Storage,
    /// Unclassified failures.
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Request => write!(f, "request"),
            ErrorCategory::Source => write!(f, "source"),
            ErrorCategory::Payload => write!(f, "payload"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Storage => write!(f, "storage"),
            ErrorCategory::Internal => write!(f, "internal"),
        }
    }
}

/// Unified error type for the field obfuscator.
#[derive(Error, Debug)]
pub enum Error {
    // Request errors (10-19)
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("missing required key '{key}'")]
    MissingField { key: String },

    #[error("invalid type for '{key}': expected {expected}")]
    InvalidFieldType { key: String, expected: String },

    #[error("'{key}' must not be empty")]
    EmptyValue { key: String },

    #[error("invalid source locator '{0}': expected s3://<bucket>/<key>")]
    InvalidLocator(String),

    #[error("unsupported file format '{suffix}': expected .csv, .json or .parquet")]
    UnsupportedFormat { suffix: String },

    // Source errors (20-29)
    #[error("source object '{path}' does not exist in container '{container}'")]
    SourceNotFound { container: String, path: String },

    // Payload errors (30-39)
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("could not decode payload as {encoding}: {message}")]
    Decode { encoding: String, message: String },

    #[error("no matching fields: none of [{}] were found in the payload", .requested.join(", "))]
    NoMatchingFields { requested: Vec<String> },

    // Config errors (40-49)
    #[error("configuration error: {0}")]
    Config(String),

    // Storage errors (50-59)
    #[error("storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors (60-69)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Request errors
    /// - 20-29: Source errors
    /// - 30-39: Payload errors
    /// - 40-49: Configuration errors
    /// - 50-59: Storage errors
    /// - 60-69: Internal errors
    pub fn code(&self) -> u32 {
        match self {
            Error::MalformedRequest(_) => 10,
            Error::MissingField { .. } => 11,
            Error::InvalidFieldType { .. } => 12,
            Error::EmptyValue { .. } => 13,
            Error::InvalidLocator(_) => 14,
            Error::UnsupportedFormat { .. } => 15,
            Error::SourceNotFound { .. } => 20,
            Error::InvalidPayload(_) => 30,
            Error::Decode { .. } => 31,
            Error::NoMatchingFields { .. } => 32,
            Error::Config(_) => 40,
            Error::Storage(_) => 50,
            Error::Io(_) => 51,
            Error::Internal(_) => 60,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MalformedRequest(_)
            | Error::MissingField { .. }
            | Error::InvalidFieldType { .. }
            | Error::EmptyValue { .. }
            | Error::InvalidLocator(_)
            | Error::UnsupportedFormat { .. } => ErrorCategory::Request,

            Error::SourceNotFound { .. } => ErrorCategory::Source,

            Error::InvalidPayload(_) | Error::Decode { .. } | Error::NoMatchingFields { .. } => {
                ErrorCategory::Payload
            }

            Error::Config(_) => ErrorCategory::Config,

            Error::Storage(_) | Error::Io(_) => ErrorCategory::Storage,

            Error::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Whether the caller can fix this by changing the request or the object.
    ///
    /// Caller errors are reported with their message; everything else is
    /// reported to the caller as a generic internal failure.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Request | ErrorCategory::Source | ErrorCategory::Payload
        )
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::MalformedRequest(_) => {
                "Send a JSON object with 'file_to_obfuscate' and 'pii_fields' keys."
            }
            Error::MissingField { .. } => {
                "Add the missing key to the request body."
            }
            Error::InvalidFieldType { .. } => {
                "'file_to_obfuscate' must be a string and 'pii_fields' a list of strings."
            }
            Error::EmptyValue { .. } => {
                "Provide a non-empty source locator and at least one field name."
            }
            Error::InvalidLocator(_) => {
                "Use the form s3://<bucket>/<key> with a lowercase bucket name."
            }
            Error::UnsupportedFormat { .. } => {
                "Only .csv, .json and .parquet objects can be obfuscated."
            }

            Error::SourceNotFound { .. } => {
                "Check the key and bucket in the request; the object may not have been uploaded yet."
            }

            Error::InvalidPayload(_) => {
                "Make sure the object content matches its extension (CSV with a header, JSON objects, or Parquet)."
            }
            Error::Decode { .. } => {
                "Pass an explicit 'encoding' that matches the file, or re-export it as UTF-8."
            }
            Error::NoMatchingFields { .. } => {
                "Field names are matched case-insensitively against the header or keys; check the spelling."
            }

            Error::Config(_) => {
                "Run 'obf config' to see resolved settings and fix the offending value."
            }

            Error::Storage(_) | Error::Io(_) => {
                "Check that the storage root exists and is writable, then retry."
            }

            Error::Internal(_) => {
                "This is a bug. Re-run with '--log-level debug' and report the log output."
            }
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::MalformedRequest(_) => "Malformed Request",
            Error::MissingField { .. } => "Missing Request Key",
            Error::InvalidFieldType { .. } => "Invalid Request Value Type",
            Error::EmptyValue { .. } => "Empty Request Value",
            Error::InvalidLocator(_) => "Invalid Source Locator",
            Error::UnsupportedFormat { .. } => "Unsupported File Format",
            Error::SourceNotFound { .. } => "Source Object Not Found",
            Error::InvalidPayload(_) => "Invalid Payload",
            Error::Decode { .. } => "Decoding Failed",
            Error::NoMatchingFields { .. } => "No Matching Fields",
            Error::Config(_) => "Configuration Error",
            Error::Storage(_) => "Storage Error",
            Error::Io(_) => "I/O Error",
            Error::Internal(_) => "Internal Error",
        }
    }

    /// Identifiers relevant to this error, for structured output.
    pub fn context(&self) -> BTreeMap<String, serde_json::Value> {
        let mut ctx = BTreeMap::new();
        match self {
            Error::MissingField { key }
            | Error::EmptyValue { key }
            | Error::InvalidFieldType { key, .. } => {
                ctx.insert("key".to_string(), serde_json::json!(key));
            }
            Error::InvalidLocator(locator) => {
                ctx.insert("locator".to_string(), serde_json::json!(locator));
            }
            Error::UnsupportedFormat { suffix } => {
                ctx.insert("suffix".to_string(), serde_json::json!(suffix));
            }
            Error::SourceNotFound { container, path } => {
                ctx.insert("container".to_string(), serde_json::json!(container));
                ctx.insert("path".to_string(), serde_json::json!(path));
            }
            Error::Decode { encoding, .. } => {
                ctx.insert("encoding".to_string(), serde_json::json!(encoding));
            }
            Error::NoMatchingFields { requested } => {
                ctx.insert("requested".to_string(), serde_json::json!(requested));
            }
            _ => {}
        }
        ctx
    }

    /// Format the error for terminal output.
    pub fn format_human(&self) -> String {
        format!(
            "✗ {}\n  Reason: {}\n  Fix: {}",
            self.headline(),
            self,
            self.remediation()
        )
    }

    /// Build a serializable report of this error.
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            category: self.category(),
            headline: self.headline().to_string(),
            message: self.to_string(),
            remediation: self.remediation().to_string(),
            context: self.context(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedRequest(err.to_string())
    }
}

/// Structured error for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: u32,
    pub category: ErrorCategory,
    pub headline: String,
    pub message: String,
    pub remediation: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(Error::MalformedRequest("x".into()).code(), 10);
        assert_eq!(
            Error::UnsupportedFormat {
                suffix: ".exe".into()
            }
            .code(),
            15
        );
        assert_eq!(
            Error::SourceNotFound {
                container: "b".into(),
                path: "k".into()
            }
            .code(),
            20
        );
        assert_eq!(Error::NoMatchingFields { requested: vec![] }.code(), 32);
        assert_eq!(Error::Internal("x".into()).code(), 60);
    }

    #[test]
    fn test_category_grouping() {
        assert_eq!(
            Error::EmptyValue {
                key: "pii_fields".into()
            }
            .category(),
            ErrorCategory::Request
        );
        assert_eq!(
            Error::Decode {
                encoding: "UTF-8".into(),
                message: "bad byte".into()
            }
            .category(),
            ErrorCategory::Payload
        );
        assert_eq!(
            Error::Storage("disk full".into()).category(),
            ErrorCategory::Storage
        );
    }

    #[test]
    fn test_caller_errors() {
        assert!(Error::InvalidLocator("ftp://x/y".into()).is_caller_error());
        assert!(Error::NoMatchingFields {
            requested: vec!["phone".into()]
        }
        .is_caller_error());
        assert!(!Error::Storage("boom".into()).is_caller_error());
        assert!(!Error::Internal("boom".into()).is_caller_error());
        assert!(!Error::Config("bad".into()).is_caller_error());
    }

    #[test]
    fn test_source_not_found_message_names_both_identifiers() {
        let err = Error::SourceNotFound {
            container: "intake".into(),
            path: "raw/users.csv".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("intake"));
        assert!(msg.contains("raw/users.csv"));

        let report = err.to_report();
        assert_eq!(report.context["container"], "intake");
        assert_eq!(report.context["path"], "raw/users.csv");
    }

    #[test]
    fn test_no_matching_fields_lists_requested() {
        let err = Error::NoMatchingFields {
            requested: vec!["phone".into(), "ssn".into()],
        };
        assert!(err.to_string().contains("phone, ssn"));
    }

    #[test]
    fn test_json_error_is_malformed_request() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), 10);
    }

    #[test]
    fn test_report_serialization() {
        let report = Error::UnsupportedFormat {
            suffix: ".exe".into(),
        }
        .to_report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["category"], "request");
        assert_eq!(json["context"]["suffix"], ".exe");
    }

    #[test]
    fn test_format_human() {
        let out = Error::MissingField {
            key: "pii_fields".into(),
        }
        .format_human();
        assert!(out.starts_with("✗ Missing Request Key"));
        assert!(out.contains("Fix:"));
    }
}
