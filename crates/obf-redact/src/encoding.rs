//! Text decoding for tabular and record payloads.
//!
//! An explicit encoding label is always obeyed. Without one, a byte-order
//! mark decides; failing that, a statistical detector guesses and reports a
//! confidence. A guess of some other encoding never beats input that is
//! valid UTF-8. Guesses under [`LOW_CONFIDENCE_THRESHOLD`] are still used, but
//! the returned [`EncodingReport`] flags them so callers can warn.
//!
//! Decoding is strict: malformed input is an error, never silently replaced.

use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;

use crate::error::{RedactionError, Result};

/// Guesses below this confidence produce a warning.
pub const LOW_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// How the encoding was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingSource {
    Override,
    ByteOrderMark,
    /// The detector guessed another encoding but the bytes are valid UTF-8.
    Utf8Validated,
    Detected,
}

/// The encoding applied to a payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodingReport {
    /// Canonical encoding name (WHATWG), e.g. `UTF-16LE`.
    pub encoding: String,
    /// Detector confidence in `[0, 1]`. Override and BOM are 1.0.
    pub confidence: f32,
    pub source: EncodingSource,
}

impl EncodingReport {
    pub fn is_low_confidence(&self) -> bool {
        self.confidence < LOW_CONFIDENCE_THRESHOLD
    }
}

/// A detector's best guess.
#[derive(Debug, Clone, PartialEq)]
pub struct CharsetGuess {
    /// Encoding label understood by `encoding_rs`.
    pub label: String,
    pub confidence: f32,
}

/// Statistical character-set detection.
pub trait CharsetDetector: Send + Sync {
    fn detect(&self, bytes: &[u8]) -> CharsetGuess;
}

/// Detector backed by the `chardet` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChardetDetector;

impl CharsetDetector for ChardetDetector {
    fn detect(&self, bytes: &[u8]) -> CharsetGuess {
        let (charset, confidence, _language) = chardet::detect(bytes);
        CharsetGuess {
            label: chardet::charset2encoding(&charset).to_string(),
            confidence,
        }
    }
}

/// Resolves and applies the text encoding of a payload.
#[derive(Debug, Clone, Default)]
pub struct EncodingResolver<D = ChardetDetector> {
    detector: D,
}

impl EncodingResolver<ChardetDetector> {
    pub fn new() -> Self {
        EncodingResolver {
            detector: ChardetDetector,
        }
    }
}

impl<D: CharsetDetector> EncodingResolver<D> {
    /// Use a custom detector.
    pub fn with_detector(detector: D) -> Self {
        EncodingResolver { detector }
    }

    /// Decode `bytes` to text, honoring `override_label` when given.
    pub fn decode(
        &self,
        bytes: &[u8],
        override_label: Option<&str>,
    ) -> Result<(String, EncodingReport)> {
        if let Some(label) = override_label {
            let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
                RedactionError::Decode {
                    encoding: label.to_string(),
                    message: "unknown encoding label".to_string(),
                }
            })?;
            let body = match Encoding::for_bom(bytes) {
                Some((bom_encoding, bom_len)) if bom_encoding == encoding => &bytes[bom_len..],
                _ => bytes,
            };
            let text = strict_decode(encoding, body)?;
            return Ok((text, report(encoding, 1.0, EncodingSource::Override)));
        }

        if bytes.is_empty() {
            return Ok((String::new(), report(UTF_8, 1.0, EncodingSource::Detected)));
        }

        if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
            let text = strict_decode(encoding, &bytes[bom_len..])?;
            return Ok((text, report(encoding, 1.0, EncodingSource::ByteOrderMark)));
        }

        let guess = self.detector.detect(bytes);
        let (encoding, confidence) = match Encoding::for_label(guess.label.as_bytes()) {
            Some(encoding) => (encoding, guess.confidence.clamp(0.0, 1.0)),
            // Unrecognized guess: fall back to UTF-8 and force a warning.
            None => (UTF_8, 0.0),
        };
        if encoding != UTF_8 {
            if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
                tracing::debug!(
                    guessed = encoding.name(),
                    confidence = f64::from(confidence),
                    "payload is valid UTF-8, ignoring detector guess"
                );
                let text = text.into_owned();
                return Ok((text, report(UTF_8, 1.0, EncodingSource::Utf8Validated)));
            }
        }

        tracing::debug!(
            encoding = encoding.name(),
            confidence = f64::from(confidence),
            "encoding detected"
        );
        let text = strict_decode(encoding, bytes)?;
        Ok((text, report(encoding, confidence, EncodingSource::Detected)))
    }
}

fn report(encoding: &'static Encoding, confidence: f32, source: EncodingSource) -> EncodingReport {
    EncodingReport {
        encoding: encoding.name().to_string(),
        confidence,
        source,
    }
}

fn strict_decode(encoding: &'static Encoding, bytes: &[u8]) -> Result<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| RedactionError::Decode {
            encoding: encoding.name().to_string(),
            message: "input contains byte sequences that are invalid in this encoding".to_string(),
        })
}
