//! Delimited-text (CSV) redaction.

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};

use crate::engine::{utf8, Redacted, Redactor};
use crate::error::{RedactionError, Result};
use crate::format::Format;
use crate::matcher::{FieldMatcher, MatchAccumulator};
use obf_common::MASK_TOKEN;

/// Redacts whole columns of a headed CSV payload.
///
/// Column order, header casing and the input's line terminator are kept.
/// Short rows are padded to the header width; rows wider than the header
/// are rejected. Padding is output normalisation: a row `1,Ann` under a
/// three-column header comes out with a trailing empty cell even when none
/// of its cells are targeted.
#[derive(Debug, Clone)]
pub struct TabularRedactor {
    delimiter: u8,
}

impl Default for TabularRedactor {
    fn default() -> Self {
        TabularRedactor { delimiter: b',' }
    }
}

impl TabularRedactor {
    pub fn with_delimiter(delimiter: u8) -> Self {
        TabularRedactor { delimiter }
    }
}

impl Redactor for TabularRedactor {
    fn format(&self) -> Format {
        Format::Tabular
    }

    fn redact(&self, payload: &[u8], matcher: &FieldMatcher) -> Result<Redacted> {
        let text = utf8(payload)?;
        let trimmed = text.trim();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            return Err(RedactionError::FormatMismatch(
                "content looks like JSON, not delimited text".to_string(),
            ));
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers = reader.headers()?.clone();
        if headers.len() < 2 {
            return Err(RedactionError::InvalidPayload(format!(
                "CSV header must declare at least two columns, found {}",
                headers.len()
            )));
        }

        let matched = matcher.match_names(headers.iter());
        let masked_columns: Vec<bool> = headers.iter().map(|h| matched.is_targeted(h)).collect();

        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .terminator(line_terminator(text))
            .from_writer(Vec::with_capacity(payload.len()));
        writer.write_record(&headers)?;

        let mut rows = 0usize;
        let mut masked = 0usize;
        let mut out = StringRecord::with_capacity(payload.len(), headers.len());
        for record in reader.records() {
            let record = record?;
            rows += 1;
            if matched.is_empty() {
                return Err(RedactionError::NoMatchingFields {
                    requested: matcher.requested().map(str::to_string).collect(),
                });
            }
            if record.len() > headers.len() {
                return Err(RedactionError::InvalidPayload(format!(
                    "data row {} has {} fields but the header declares {}",
                    rows,
                    record.len(),
                    headers.len()
                )));
            }

            out.clear();
            for (idx, &mask) in masked_columns.iter().enumerate() {
                if mask {
                    out.push_field(MASK_TOKEN);
                    masked += 1;
                } else {
                    out.push_field(record.get(idx).unwrap_or(""));
                }
            }
            writer.write_record(&out)?;
        }

        let output = writer
            .into_inner()
            .map_err(|e| RedactionError::InvalidPayload(e.to_string()))?;

        let mut acc = MatchAccumulator::new(matcher);
        acc.absorb(&matched);
        Ok(Redacted {
            output,
            report: acc.finish(rows, masked),
        })
    }
}

fn line_terminator(text: &str) -> Terminator {
    if text.contains("\r\n") {
        Terminator::CRLF
    } else {
        Terminator::Any(b'\n')
    }
}
