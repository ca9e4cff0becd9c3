//! Field obfuscator common types and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - The unified error taxonomy with stable codes
//! - Source locators (`s3://<container>/<path>`)
//! - Redaction request parsing and validation
//! - Output format specifications

pub mod error;
pub mod locator;
pub mod output;
pub mod request;

pub use error::{Error, ErrorCategory, ErrorReport, Result};
pub use locator::SourceLocator;
pub use output::OutputFormat;
pub use request::RedactionRequest;

/// Token written in place of every redacted value.
pub const MASK_TOKEN: &str = "***";
