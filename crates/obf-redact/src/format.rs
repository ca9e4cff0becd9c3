//! Format detection from the object suffix.

use serde::{Deserialize, Serialize};

use crate::error::{RedactionError, Result};
use obf_common::SourceLocator;

/// Payload formats the engines understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Delimited rows with a header (`.csv`).
    Tabular,
    /// JSON object or list of objects (`.json`).
    Record,
    /// Parquet (`.parquet`).
    Columnar,
}

impl Format {
    /// Map a lowercased suffix (including the dot) to a format.
    pub fn from_suffix(suffix: Option<&str>) -> Result<Self> {
        match suffix {
            Some(".csv") => Ok(Format::Tabular),
            Some(".json") => Ok(Format::Record),
            Some(".parquet") => Ok(Format::Columnar),
            Some(other) => Err(RedactionError::UnsupportedFormat {
                suffix: other.to_string(),
            }),
            None => Err(RedactionError::UnsupportedFormat {
                suffix: "(none)".to_string(),
            }),
        }
    }

    /// Detect the format of the object a locator points at.
    pub fn detect(locator: &SourceLocator) -> Result<Self> {
        Self::from_suffix(locator.suffix().as_deref())
    }

    /// Whether the payload is text that needs decoding first.
    pub fn is_text(self) -> bool {
        !matches!(self, Format::Columnar)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Tabular => "csv",
            Format::Record => "json",
            Format::Columnar => "parquet",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Tabular => write!(f, "tabular"),
            Format::Record => write!(f, "record"),
            Format::Columnar => write!(f, "columnar"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(raw: &str) -> Result<Format> {
        Format::detect(&SourceLocator::parse(raw).unwrap())
    }

    #[test]
    fn test_known_suffixes() {
        assert_eq!(detect("s3://bucket/a.csv").unwrap(), Format::Tabular);
        assert_eq!(detect("s3://bucket/dir/a.JSON").unwrap(), Format::Record);
        assert_eq!(detect("s3://bucket/a.Parquet").unwrap(), Format::Columnar);
    }

    #[test]
    fn test_unknown_suffix_is_named() {
        let err = detect("s3://bucket/file.exe").unwrap_err();
        assert!(matches!(err, RedactionError::UnsupportedFormat { ref suffix } if suffix == ".exe"));
    }

    #[test]
    fn test_no_suffix() {
        assert!(matches!(
            detect("s3://bucket/Makefile"),
            Err(RedactionError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_text_formats() {
        assert!(Format::Tabular.is_text());
        assert!(Format::Record.is_text());
        assert!(!Format::Columnar.is_text());
    }
}
