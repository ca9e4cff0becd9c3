//! Structured event definitions for logging.
//!
//! Events follow a consistent schema for machine-parseable JSONL output.
//! Every event carries the run ID and the pipeline stage it was raised in.
//! Event fields hold names, counts and locators; never cell values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Stages of one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Request parsing and format selection.
    Validating,
    /// Reading the source object.
    Fetching,
    /// Encoding resolution for text formats.
    Detecting,
    /// Field matching and masking.
    Redacting,
    /// Existence check on the target object.
    CheckingTarget,
    Writing,
    /// Target existed and overwrite was not allowed.
    Skipped,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Validating => "validating",
            Stage::Fetching => "fetching",
            Stage::Detecting => "detecting",
            Stage::Redacting => "redacting",
            Stage::CheckingTarget => "checking_target",
            Stage::Writing => "writing",
            Stage::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const PIPELINE_STARTED: &str = "pipeline.started";
    pub const PIPELINE_STAGE: &str = "pipeline.stage";
    pub const PIPELINE_FINISHED: &str = "pipeline.finished";
    pub const PIPELINE_FAILED: &str = "pipeline.failed";

    // Detection
    pub const DETECT_ENCODING: &str = "detect.encoding";
    pub const DETECT_LOW_CONFIDENCE: &str = "detect.low_confidence";

    // Redaction
    pub const REDACT_FIELDS_MISSING: &str = "redact.fields_missing";
    pub const REDACT_FINISHED: &str = "redact.finished";

    // Write
    pub const WRITE_CONFLICT: &str = "write.conflict";
    pub const WRITE_FINISHED: &str = "write.finished";

    // Trigger adapter
    pub const TRIGGER_RECEIVED: &str = "trigger.received";
    pub const TRIGGER_RECORD_FAILED: &str = "trigger.record_failed";
    pub const TRIGGER_REJECTED: &str = "trigger.rejected";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
}

/// A structured pipeline event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// Timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    pub level: Level,

    /// Event name (e.g., "pipeline.started", "write.conflict").
    pub event: String,

    /// Unique ID for this pipeline invocation.
    pub run_id: String,

    pub stage: Stage,

    /// Human-readable message.
    pub message: String,

    /// Additional structured fields (stable keys).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl PipelineEvent {
    /// Create a new event with required fields.
    pub fn new(
        level: Level,
        event: impl Into<String>,
        run_id: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> Self {
        PipelineEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            run_id: run_id.into(),
            stage,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a field to the event.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    /// Serialize to a single JSONL line.
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
