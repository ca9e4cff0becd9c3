//! Caller-facing result surface.
//!
//! Every pipeline run ends as an [`InvocationResult`]: a status code and a
//! message safe to hand back to whoever triggered the run.

use serde::{Deserialize, Serialize};

use obf_common::{Error, ErrorCategory, ErrorReport};

use crate::pipeline::PipelineOutcome;

/// Message returned for internal failures. Details go to the log sink only.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Status codes used by the result surface.
pub mod status {
    pub const WRITTEN: u16 = 200;
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const CONFLICT: u16 = 409;
    pub const INTERNAL: u16 = 500;
}

/// Status code plus caller-safe message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
    /// Structured error for caller-correctable failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl InvocationResult {
    pub fn from_outcome(outcome: &PipelineOutcome) -> Self {
        match outcome {
            PipelineOutcome::Written { target, .. } => InvocationResult {
                status_code: status::WRITTEN,
                body: format!("Obfuscated file written to {target}"),
                error: None,
            },
            PipelineOutcome::Skipped { target } => InvocationResult {
                status_code: status::CONFLICT,
                body: format!("File already exists: {target}"),
                error: None,
            },
        }
    }

    pub fn from_error(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Source => InvocationResult {
                status_code: status::NOT_FOUND,
                body: err.to_string(),
                error: Some(err.to_report()),
            },
            ErrorCategory::Request | ErrorCategory::Payload => InvocationResult {
                status_code: status::BAD_REQUEST,
                body: err.to_string(),
                error: Some(err.to_report()),
            },
            ErrorCategory::Config | ErrorCategory::Storage | ErrorCategory::Internal => {
                InvocationResult {
                    status_code: status::INTERNAL,
                    body: INTERNAL_ERROR_MESSAGE.to_string(),
                    error: None,
                }
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == status::WRITTEN
    }
}

impl From<Result<PipelineOutcome, Error>> for InvocationResult {
    fn from(result: Result<PipelineOutcome, Error>) -> Self {
        match result {
            Ok(outcome) => Self::from_outcome(&outcome),
            Err(err) => Self::from_error(&err),
        }
    }
}
