//! Field redaction engines for the obfuscator.
//!
//! This crate turns a payload plus a list of requested field names into a
//! copy of the payload in which every value of a matched field is replaced by
//! the mask token `***`.
//!
//! # Key Features
//!
//! - **Format detection**: `.csv`, `.json` and `.parquet` suffixes select the
//!   tabular, record and columnar engines; anything else is rejected before
//!   any bytes are read.
//! - **Encoding resolution**: explicit override, byte-order mark, or
//!   statistical detection with a low-confidence flag.
//! - **Case-insensitive matching** with payload-wide found/missing accounting.
//! - **All-or-nothing on total miss**: if no requested field exists anywhere,
//!   redaction fails instead of returning the input unchanged.
//! - **Idempotent**: re-redacting redacted output changes nothing.
//!
//! # Example
//!
//! ```
//! use obf_redact::{Format, RedactionEngine};
//!
//! let engine = RedactionEngine::new();
//! let out = engine
//!     .redact_fields(Format::Tabular, b"id,Name\n1,Ann\n", &["name"])
//!     .unwrap();
//! assert_eq!(out.output, b"id,Name\n1,***\n");
//! ```

pub mod columnar;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod format;
pub mod matcher;
pub mod record;
pub mod tabular;

pub use columnar::ColumnarRedactor;
pub use encoding::{
    CharsetDetector, CharsetGuess, ChardetDetector, EncodingReport, EncodingResolver,
    EncodingSource, LOW_CONFIDENCE_THRESHOLD,
};
pub use engine::{Redacted, RedactionEngine, RedactionOutcome, Redactor};
pub use error::{RedactionError, Result};
pub use format::Format;
pub use matcher::{FieldBinding, FieldMatchResult, FieldMatcher, MatchAccumulator, MatchReport};
pub use obf_common::MASK_TOKEN;
pub use record::RecordRedactor;
pub use tabular::TabularRedactor;
