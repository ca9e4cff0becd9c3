//! Redaction requests and their validation.
//!
//! Wire form:
//! ```json
//! {"file_to_obfuscate": "s3://bucket/users.csv", "pii_fields": ["name", "email"], "encoding": "utf-16"}
//! ```
//!
//! Validation runs in a fixed order so the first problem reported is stable:
//! JSON syntax, source key presence/type/emptiness, field list
//! presence/type/emptiness, element types, locator shape, then the optional
//! `encoding` and `force` keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::locator::SourceLocator;

pub const KEY_SOURCE: &str = "file_to_obfuscate";
pub const KEY_FIELDS: &str = "pii_fields";
pub const KEY_ENCODING: &str = "encoding";
pub const KEY_FORCE: &str = "force";

/// A validated request to redact fields from one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionRequest {
    /// Object to read.
    pub source: SourceLocator,
    /// Requested field names, in request order.
    pub fields: Vec<String>,
    /// Explicit text encoding label; skips detection when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Per-request overwrite override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

impl RedactionRequest {
    /// Build a request from already-typed parts.
    pub fn new(source: SourceLocator, fields: Vec<String>) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::EmptyValue {
                key: KEY_FIELDS.to_string(),
            });
        }
        Ok(RedactionRequest {
            source,
            fields,
            encoding: None,
            force: None,
        })
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }

    /// Parse and validate a JSON request body.
    pub fn from_json(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| Error::MalformedRequest(format!("invalid JSON input: {e}")))?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::MalformedRequest("request must be a JSON object".to_string()))?;

        let source = required_string(obj, KEY_SOURCE)?;
        let fields = required_string_list(obj, KEY_FIELDS)?;
        let source = SourceLocator::parse(source)?;

        let encoding = match obj.get(KEY_ENCODING) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(invalid_type(KEY_ENCODING, "a string")),
        };

        let force = optional_bool(obj, KEY_FORCE)?;

        Ok(RedactionRequest {
            source,
            fields,
            encoding,
            force,
        })
    }
}

// Per-key checks shared by every JSON entry point (requests, notifications).

/// A present value of the wrong shape.
pub fn invalid_type(key: &str, expected: &str) -> Error {
    Error::InvalidFieldType {
        key: key.to_string(),
        expected: expected.to_string(),
    }
}

fn required_string<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    let value = obj.get(key).ok_or_else(|| Error::MissingField {
        key: key.to_string(),
    })?;
    let s = value.as_str().ok_or_else(|| invalid_type(key, "a string"))?;
    if s.trim().is_empty() {
        return Err(Error::EmptyValue {
            key: key.to_string(),
        });
    }
    Ok(s)
}

/// A non-empty list whose every entry is a string.
pub fn required_string_list(obj: &Map<String, Value>, key: &str) -> Result<Vec<String>> {
    let value = obj.get(key).ok_or_else(|| Error::MissingField {
        key: key.to_string(),
    })?;
    string_list(key, value)
}

/// Like [`required_string_list`], but absent or `null` is `None`.
pub fn optional_string_list(obj: &Map<String, Value>, key: &str) -> Result<Option<Vec<String>>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => string_list(key, value).map(Some),
    }
}

/// An optional boolean; absent or `null` is `None`.
pub fn optional_bool(obj: &Map<String, Value>, key: &str) -> Result<Option<bool>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(invalid_type(key, "a boolean")),
    }
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid_type(key, "a list of strings"))?;
    if items.is_empty() {
        return Err(Error::EmptyValue {
            key: key.to_string(),
        });
    }
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid_type(key, "a list of strings"))
        })
        .collect()
}
