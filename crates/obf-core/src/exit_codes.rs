//! Exit codes for the `obf` CLI.
//!
//! Exit codes communicate operation outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-1: Operational outcomes (written, or skipped because the target exists)
//! - 10-19: Caller/environment errors (fixable by changing the input)
//! - 20-29: Internal errors (storage failures, bugs)

use obf_common::{Error, ErrorCategory};

use crate::outcome::status;

/// Exit codes for `obf` operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-1)
    // ========================================================================
    /// Success: output produced or written
    Ok = 0,

    /// Target already exists and overwrite was not allowed
    Conflict = 1,

    // ========================================================================
    // Caller / Environment Errors (10-19)
    // ========================================================================
    /// Invalid request, arguments or payload
    CallerError = 10,

    /// Source object does not exist
    NotFound = 11,

    /// Settings could not be loaded or are invalid
    ConfigError = 12,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// Storage backend failure
    StorageError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Operational outcomes (codes 0-1). Not errors.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Caller/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Ok => "OK",
            ExitCode::Conflict => "OK_CONFLICT",
            ExitCode::CallerError => "ERR_CALLER",
            ExitCode::NotFound => "ERR_NOT_FOUND",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::StorageError => "ERR_STORAGE",
        }
    }

    /// Exit code for a failed run.
    pub fn for_error(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Source => ExitCode::NotFound,
            ErrorCategory::Request | ErrorCategory::Payload => ExitCode::CallerError,
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Storage => ExitCode::StorageError,
            ErrorCategory::Internal => ExitCode::InternalError,
        }
    }

    /// Exit code for a result-surface status code.
    pub fn for_status(status_code: u16) -> Self {
        match status_code {
            status::WRITTEN => ExitCode::Ok,
            status::CONFLICT => ExitCode::Conflict,
            status::NOT_FOUND => ExitCode::NotFound,
            status::BAD_REQUEST => ExitCode::CallerError,
            _ => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges() {
        assert!(ExitCode::Ok.is_operational());
        assert!(ExitCode::Conflict.is_operational());
        assert!(ExitCode::NotFound.is_user_error());
        assert!(ExitCode::StorageError.is_internal_error());
        assert!(!ExitCode::ConfigError.is_internal_error());
    }

    #[test]
    fn test_for_error() {
        let not_found = Error::SourceNotFound {
            container: "b".into(),
            path: "a.csv".into(),
        };
        assert_eq!(ExitCode::for_error(&not_found), ExitCode::NotFound);
        assert_eq!(
            ExitCode::for_error(&Error::NoMatchingFields { requested: vec!["x".into()] }),
            ExitCode::CallerError
        );
        assert_eq!(
            ExitCode::for_error(&Error::Storage("disk".into())),
            ExitCode::StorageError
        );
        assert_eq!(ExitCode::for_error(&Error::Config("bad".into())), ExitCode::ConfigError);
    }

    #[test]
    fn test_for_status() {
        assert_eq!(ExitCode::for_status(200), ExitCode::Ok);
        assert_eq!(ExitCode::for_status(409), ExitCode::Conflict);
        assert_eq!(ExitCode::for_status(404), ExitCode::NotFound);
        assert_eq!(ExitCode::for_status(400), ExitCode::CallerError);
        assert_eq!(ExitCode::for_status(500), ExitCode::InternalError);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::Conflict.to_string(), "OK_CONFLICT (1)");
    }
}
