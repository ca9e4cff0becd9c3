//! Source locators of the form `s3://<container>/<path>`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Addressing scheme accepted for source and target objects.
pub const SCHEME: &str = "s3";

static RE_LOCATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^s3://([a-z0-9][a-z0-9.\-]{1,61}[a-z0-9])/(.+)$").expect("valid locator regex")
});

/// A parsed, validated object location.
///
/// The container follows bucket naming (3-63 chars of lowercase letters,
/// digits, dots and hyphens, starting and ending alphanumeric). The path is
/// any non-empty remainder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceLocator {
    container: String,
    path: String,
}

impl SourceLocator {
    /// Parse a locator string.
    pub fn parse(input: &str) -> Result<Self> {
        let caps = RE_LOCATOR
            .captures(input)
            .ok_or_else(|| Error::InvalidLocator(input.to_string()))?;
        Ok(SourceLocator {
            container: caps[1].to_string(),
            path: caps[2].to_string(),
        })
    }

    /// Build a locator from its parts, applying the same validation as [`parse`](Self::parse).
    pub fn new(container: &str, path: &str) -> Result<Self> {
        Self::parse(&format!("{SCHEME}://{container}/{path}"))
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Lowercased trailing suffix of the file name, including the dot.
    pub fn suffix(&self) -> Option<String> {
        let name = self.file_name();
        name.rfind('.').map(|idx| name[idx..].to_lowercase())
    }

    /// Location with the same container and file name under `prefix`.
    ///
    /// `prefix` is used verbatim, so it normally ends in `/`.
    pub fn sibling_under(&self, prefix: &str) -> SourceLocator {
        SourceLocator {
            container: self.container.clone(),
            path: format!("{}{}", prefix, self.file_name()),
        }
    }
}

impl std::fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}/{}", SCHEME, self.container, self.path)
    }
}

impl FromStr for SourceLocator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SourceLocator {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SourceLocator> for String {
    fn from(value: SourceLocator) -> Self {
        value.to_string()
    }
}
