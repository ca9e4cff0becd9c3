//! Case-insensitive field matching.
//!
//! A [`FieldMatcher`] holds the requested names. Matching it against the
//! actual names of one record (or one header) yields an immutable
//! [`FieldMatchResult`]. Record-oriented payloads produce one result per
//! element; a [`MatchAccumulator`] folds them into the payload-wide
//! [`MatchReport`].

use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::error::{RedactionError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestedField {
    original: String,
    key: String,
}

/// The requested field names, deduplicated by lowercased identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatcher {
    requested: Vec<RequestedField>,
}

impl FieldMatcher {
    /// Build a matcher from field names. First spelling of a name wins.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut requested = Vec::new();
        for field in fields {
            let original = field.as_ref().to_string();
            let key = original.to_lowercase();
            if seen.insert(key.clone()) {
                requested.push(RequestedField { original, key });
            }
        }
        if requested.is_empty() {
            return Err(RedactionError::EmptyFieldList);
        }
        Ok(FieldMatcher { requested })
    }

    /// Build a matcher from untyped JSON values.
    ///
    /// Any non-string entry rejects the whole list.
    pub fn from_values(values: &[Value]) -> Result<Self> {
        let mut names = Vec::with_capacity(values.len());
        for value in values {
            match value {
                Value::String(s) => names.push(s.as_str()),
                other => return Err(RedactionError::InvalidFieldType(json_kind(other).to_string())),
            }
        }
        Self::new(names)
    }

    /// Requested names as given.
    pub fn requested(&self) -> impl Iterator<Item = &str> {
        self.requested.iter().map(|r| r.original.as_str())
    }

    /// Match against the actual names of one record or header.
    pub fn match_names<'a, I>(&self, actual: I) -> FieldMatchResult
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut by_key: HashMap<String, &'a str> = HashMap::new();
        for name in actual {
            by_key.entry(name.to_lowercase()).or_insert(name);
        }

        let mut bindings = Vec::new();
        let mut missing = Vec::new();
        let mut targeted = HashSet::new();
        for field in &self.requested {
            match by_key.get(&field.key) {
                Some(actual) => {
                    bindings.push(FieldBinding {
                        requested: field.original.clone(),
                        actual: (*actual).to_string(),
                    });
                    targeted.insert(field.key.clone());
                }
                None => missing.push(field.original.clone()),
            }
        }

        FieldMatchResult {
            bindings,
            missing,
            targeted,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One requested name bound to the actual name it matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldBinding {
    pub requested: String,
    pub actual: String,
}

/// Outcome of matching against one set of actual names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatchResult {
    bindings: Vec<FieldBinding>,
    missing: Vec<String>,
    targeted: HashSet<String>,
}

impl FieldMatchResult {
    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// True when nothing matched.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether the value under `actual` must be masked.
    ///
    /// Every actual name that lowercases to a bound key qualifies, so
    /// `Email` and `EMAIL` in the same header are both masked.
    pub fn is_targeted(&self, actual: &str) -> bool {
        !self.targeted.is_empty() && self.targeted.contains(&actual.to_lowercase())
    }
}

/// Payload-wide matching summary returned by every engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    /// First binding seen for each requested field that matched anywhere.
    pub found: Vec<FieldBinding>,
    /// Requested fields that matched nowhere.
    pub missing: Vec<String>,
    /// Data rows, JSON objects, or Parquet rows inspected.
    pub records_scanned: usize,
    /// Cells replaced with the mask token.
    pub cells_masked: usize,
}

impl MatchReport {
    /// Some, but not all, requested fields were found.
    pub fn is_partial(&self) -> bool {
        !self.found.is_empty() && !self.missing.is_empty()
    }
}

/// Folds per-record results into one [`MatchReport`].
#[derive(Debug)]
pub struct MatchAccumulator<'m> {
    matcher: &'m FieldMatcher,
    found: HashMap<String, FieldBinding>,
}

impl<'m> MatchAccumulator<'m> {
    pub fn new(matcher: &'m FieldMatcher) -> Self {
        MatchAccumulator {
            matcher,
            found: HashMap::new(),
        }
    }

    pub fn absorb(&mut self, result: &FieldMatchResult) {
        for binding in &result.bindings {
            self.found
                .entry(binding.requested.to_lowercase())
                .or_insert_with(|| binding.clone());
        }
    }

    pub fn found_any(&self) -> bool {
        !self.found.is_empty()
    }

    /// Fail with `NoMatchingFields` when nothing matched anywhere.
    pub fn ensure_found(&self) -> Result<()> {
        if self.found_any() {
            Ok(())
        } else {
            Err(RedactionError::NoMatchingFields {
                requested: self.matcher.requested().map(str::to_string).collect(),
            })
        }
    }

    pub fn finish(self, records_scanned: usize, cells_masked: usize) -> MatchReport {
        let mut found = Vec::new();
        let mut missing = Vec::new();
        for field in &self.matcher.requested {
            match self.found.get(&field.key) {
                Some(binding) => found.push(binding.clone()),
                None => missing.push(field.original.clone()),
            }
        }
        MatchReport {
            found,
            missing,
            records_scanned,
            cells_masked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_case_insensitive_binding() {
        let matcher = FieldMatcher::new(["name", "EMAIL"]).unwrap();
        let result = matcher.match_names(["Id", "Name", "Email"]);
        assert_eq!(
            result.bindings(),
            &[
                FieldBinding {
                    requested: "name".into(),
                    actual: "Name".into()
                },
                FieldBinding {
                    requested: "EMAIL".into(),
                    actual: "Email".into()
                },
            ]
        );
        assert!(result.missing().is_empty());
        assert!(result.is_targeted("NAME"));
        assert!(!result.is_targeted("Id"));
    }

    #[test]
    fn test_missing_fields_reported() {
        let matcher = FieldMatcher::new(["name", "phone"]).unwrap();
        let result = matcher.match_names(["id", "name"]);
        assert_eq!(result.missing(), &["phone".to_string()]);
        assert!(!result.is_empty());
    }

    #[test]
    fn test_duplicate_requests_collapse() {
        let matcher = FieldMatcher::new(["Email", "email", "EMAIL"]).unwrap();
        assert_eq!(matcher.requested().collect::<Vec<_>>(), vec!["Email"]);
    }

    #[test]
    fn test_duplicate_case_columns_all_targeted() {
        let matcher = FieldMatcher::new(["email"]).unwrap();
        let result = matcher.match_names(["email", "EMAIL"]);
        assert_eq!(result.bindings().len(), 1);
        assert_eq!(result.bindings()[0].actual, "email");
        assert!(result.is_targeted("email"));
        assert!(result.is_targeted("EMAIL"));
    }

    #[test]
    fn test_non_string_values_rejected() {
        let err = FieldMatcher::from_values(&[json!("name"), json!(7)]).unwrap_err();
        assert!(matches!(err, RedactionError::InvalidFieldType(ref kind) if kind == "number"));
        assert!(FieldMatcher::from_values(&[json!("name")]).is_ok());
    }

    #[test]
    fn test_empty_field_list() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            FieldMatcher::new(empty),
            Err(RedactionError::EmptyFieldList)
        ));
    }

    #[test]
    fn test_accumulator_aggregates_across_records() {
        let matcher = FieldMatcher::new(["name", "email", "phone"]).unwrap();
        let mut acc = MatchAccumulator::new(&matcher);
        acc.absorb(&matcher.match_names(["id", "name"]));
        acc.absorb(&matcher.match_names(["id", "Email"]));
        acc.ensure_found().unwrap();

        let report = acc.finish(2, 2);
        assert_eq!(report.found.len(), 2);
        assert_eq!(report.found[1].actual, "Email");
        assert_eq!(report.missing, vec!["phone"]);
        assert!(report.is_partial());
    }

    #[test]
    fn test_accumulator_total_miss() {
        let matcher = FieldMatcher::new(["phone"]).unwrap();
        let mut acc = MatchAccumulator::new(&matcher);
        acc.absorb(&matcher.match_names(["id", "name"]));
        let err = acc.ensure_found().unwrap_err();
        assert!(matches!(err, RedactionError::NoMatchingFields { ref requested } if requested == &["phone".to_string()]));
    }
}
