//! JSON record redaction.

use serde_json::{Map, Value};

use crate::engine::{utf8, Redacted, Redactor};
use crate::error::{RedactionError, Result};
use crate::format::Format;
use crate::matcher::{FieldMatcher, MatchAccumulator};
use obf_common::MASK_TOKEN;

/// Redacts keys of a JSON object or of every object in a JSON list.
///
/// Each object is matched on its own keys; found/missing accounting spans
/// the whole payload. Output is pretty-printed with key order, number
/// literals and non-ASCII characters preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordRedactor;

impl Redactor for RecordRedactor {
    fn format(&self) -> Format {
        Format::Record
    }

    fn redact(&self, payload: &[u8], matcher: &FieldMatcher) -> Result<Redacted> {
        let text = utf8(payload)?;
        let mut doc: Value = serde_json::from_str(text)
            .map_err(|e| RedactionError::InvalidPayload(format!("invalid JSON: {e}")))?;

        let mut acc = MatchAccumulator::new(matcher);
        let mut records = 0usize;
        let mut masked = 0usize;

        match &mut doc {
            Value::Object(obj) => {
                records = 1;
                masked += mask_object(obj, matcher, &mut acc);
            }
            Value::Array(items) => {
                if let Some(idx) = items.iter().position(|item| !item.is_object()) {
                    return Err(RedactionError::UnsupportedStructure(format!(
                        "list element {idx} is not an object"
                    )));
                }
                for item in items.iter_mut() {
                    if let Value::Object(obj) = item {
                        records += 1;
                        masked += mask_object(obj, matcher, &mut acc);
                    }
                }
            }
            other => {
                return Err(RedactionError::UnsupportedStructure(format!(
                    "expected an object or a list of objects, got {}",
                    top_level_kind(other)
                )));
            }
        }

        acc.ensure_found()?;

        let output = serde_json::to_vec_pretty(&doc)?;
        Ok(Redacted {
            output,
            report: acc.finish(records, masked),
        })
    }
}

fn mask_object(
    obj: &mut Map<String, Value>,
    matcher: &FieldMatcher,
    acc: &mut MatchAccumulator<'_>,
) -> usize {
    let matched = matcher.match_names(obj.keys().map(String::as_str));
    acc.absorb(&matched);
    if matched.is_empty() {
        return 0;
    }

    let mut masked = 0;
    for (key, value) in obj.iter_mut() {
        if matched.is_targeted(key) {
            *value = Value::String(MASK_TOKEN.to_string());
            masked += 1;
        }
    }
    masked
}

fn top_level_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn redact(input: &str, fields: &[&str]) -> Result<(Value, crate::MatchReport)> {
        let matcher = FieldMatcher::new(fields.iter().copied())?;
        let out = RecordRedactor.redact(input.as_bytes(), &matcher)?;
        Ok((serde_json::from_slice(&out.output).unwrap(), out.report))
    }

    #[test]
    fn test_untargeted_numbers_keep_their_digits() {
        let input = r#"[{"id": 123456789012345678901234567890, "name": "Ann"}, {"id": -98765432109876543210, "amount": 0.1000000000000000055511151231257827, "name": null}]"#;
        let matcher = FieldMatcher::new(["name"]).unwrap();
        let out = RecordRedactor.redact(input.as_bytes(), &matcher).unwrap();
        let text = String::from_utf8(out.output).unwrap();
        assert!(text.contains("\"id\": 123456789012345678901234567890,"));
        assert!(text.contains("\"id\": -98765432109876543210,"));
        assert!(text.contains("\"amount\": 0.1000000000000000055511151231257827,"));
        assert_eq!(out.report.cells_masked, 2);
    }

    #[test]
    fn test_single_object() {
        let (out, report) = redact(
            r#"{"id": 1, "Name": "Ann", "email": "ann@x.io"}"#,
            &["name", "email"],
        )
        .unwrap();
        assert_eq!(out, json!({"id": 1, "Name": "***", "email": "***"}));
        assert_eq!(report.records_scanned, 1);
        assert_eq!(report.cells_masked, 2);
    }

    #[test]
    fn test_list_aggregates_accounting() {
        let (out, report) = redact(
            r#"[{"id": 1, "name": "Ann"}, {"id": 2, "email": "bo@x.io"}]"#,
            &["name", "email", "phone"],
        )
        .unwrap();
        assert_eq!(
            out,
            json!([{"id": 1, "name": "***"}, {"id": 2, "email": "***"}])
        );
        assert_eq!(report.found.len(), 2);
        assert_eq!(report.missing, vec!["phone"]);
    }

    #[test]
    fn test_non_string_values_become_mask() {
        let (out, _) = redact(
            r#"{"id": 1, "name": null, "email": {"work": "a@x.io"}}"#,
            &["name", "email"],
        )
        .unwrap();
        assert_eq!(out, json!({"id": 1, "name": "***", "email": "***"}));
    }

    #[test]
    fn test_no_match_anywhere() {
        let err = redact(r#"[{"id": 1}, {"id": 2}]"#, &["phone"]).unwrap_err();
        assert!(matches!(err, RedactionError::NoMatchingFields { .. }));
        let err = redact("[]", &["name"]).unwrap_err();
        assert!(matches!(err, RedactionError::NoMatchingFields { .. }));
    }

    #[test]
    fn test_unsupported_structures() {
        let err = redact(r#"["Ann", "Bo"]"#, &["name"]).unwrap_err();
        assert!(matches!(err, RedactionError::UnsupportedStructure(_)));
        let err = redact(r#"[{"name": "Ann"}, 3]"#, &["name"]).unwrap_err();
        assert!(matches!(err, RedactionError::UnsupportedStructure(_)));
        let err = redact("42", &["name"]).unwrap_err();
        assert!(matches!(err, RedactionError::UnsupportedStructure(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = redact("{\"name\": ", &["name"]).unwrap_err();
        assert!(matches!(err, RedactionError::InvalidPayload(_)));
    }

    #[test]
    fn test_output_is_indented_and_keeps_unicode() {
        let matcher = FieldMatcher::new(["email"]).unwrap();
        let out = RecordRedactor
            .redact(r#"{"name": "Zoë", "email": "z@x.io"}"#.as_bytes(), &matcher)
            .unwrap();
        let text = String::from_utf8(out.output).unwrap();
        assert_eq!(text, "{\n  \"name\": \"Zoë\",\n  \"email\": \"***\"\n}");
    }

    #[test]
    fn test_idempotent() {
        let matcher = FieldMatcher::new(["name"]).unwrap();
        let first = RecordRedactor
            .redact(br#"[{"name": "Ann", "id": 1}]"#, &matcher)
            .unwrap();
        let second = RecordRedactor.redact(&first.output, &matcher).unwrap();
        assert_eq!(first.output, second.output);
    }
}
