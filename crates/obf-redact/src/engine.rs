//! Format dispatch and the common redaction capability.

use serde::Serialize;

use crate::columnar::ColumnarRedactor;
use crate::encoding::{ChardetDetector, CharsetDetector, EncodingReport, EncodingResolver};
use crate::error::{RedactionError, Result};
use crate::format::Format;
use crate::matcher::{FieldMatcher, MatchReport};
use crate::record::RecordRedactor;
use crate::tabular::TabularRedactor;

/// Output of a single-format redactor.
#[derive(Debug, Clone, PartialEq)]
pub struct Redacted {
    pub output: Vec<u8>,
    pub report: MatchReport,
}

/// One redaction handler per [`Format`].
///
/// Text formats receive UTF-8 bytes; decoding happens before dispatch.
pub trait Redactor: Send + Sync {
    fn format(&self) -> Format;

    fn redact(&self, payload: &[u8], matcher: &FieldMatcher) -> Result<Redacted>;
}

/// Full result of [`RedactionEngine::redact`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedactionOutcome {
    pub format: Format,
    #[serde(skip)]
    pub output: Vec<u8>,
    pub report: MatchReport,
    /// Set for text formats only.
    pub encoding: Option<EncodingReport>,
}

/// Decodes text payloads and dispatches to the matching redactor.
pub struct RedactionEngine<D = ChardetDetector> {
    resolver: EncodingResolver<D>,
    tabular: TabularRedactor,
    record: RecordRedactor,
    columnar: ColumnarRedactor,
}

impl Default for RedactionEngine<ChardetDetector> {
    fn default() -> Self {
        Self::new()
    }
}

impl RedactionEngine<ChardetDetector> {
    pub fn new() -> Self {
        Self::with_detector(ChardetDetector)
    }
}

impl<D: CharsetDetector> RedactionEngine<D> {
    /// Create an engine with a custom charset detector.
    pub fn with_detector(detector: D) -> Self {
        RedactionEngine {
            resolver: EncodingResolver::with_detector(detector),
            tabular: TabularRedactor::default(),
            record: RecordRedactor,
            columnar: ColumnarRedactor::default(),
        }
    }

    /// The handler for `format`.
    pub fn redactor(&self, format: Format) -> &dyn Redactor {
        match format {
            Format::Tabular => &self.tabular,
            Format::Record => &self.record,
            Format::Columnar => &self.columnar,
        }
    }

    /// Decode (text formats), then redact `payload`.
    pub fn redact(
        &self,
        format: Format,
        payload: &[u8],
        matcher: &FieldMatcher,
        encoding: Option<&str>,
    ) -> Result<RedactionOutcome> {
        let (redacted, encoding) = if format.is_text() {
            let (text, report) = self.resolver.decode(payload, encoding)?;
            let redacted = self.redactor(format).redact(text.as_bytes(), matcher)?;
            (redacted, Some(report))
        } else {
            (self.redactor(format).redact(payload, matcher)?, None)
        };

        tracing::debug!(
            format = %format,
            records = redacted.report.records_scanned,
            masked = redacted.report.cells_masked,
            "payload redacted"
        );

        Ok(RedactionOutcome {
            format,
            output: redacted.output,
            report: redacted.report,
            encoding,
        })
    }

    /// Convenience wrapper taking plain field names.
    pub fn redact_fields<S: AsRef<str>>(
        &self,
        format: Format,
        payload: &[u8],
        fields: &[S],
    ) -> Result<RedactionOutcome> {
        let matcher = FieldMatcher::new(fields.iter().map(|f| f.as_ref()))?;
        self.redact(format, payload, &matcher, None)
    }
}

/// Borrow `payload` as UTF-8 text.
pub(crate) fn utf8(payload: &[u8]) -> Result<&str> {
    std::str::from_utf8(payload).map_err(|e| RedactionError::Decode {
        encoding: "UTF-8".to_string(),
        message: e.to_string(),
    })
}
