//! Object-created notifications.
//!
//! A notification carries one or more `(bucket, key)` records plus optional
//! top-level `force` and `pii_fields`. Every record becomes an independent
//! pipeline run and yields its own [`InvocationResult`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use obf_common::request::{invalid_type, optional_bool, optional_string_list, KEY_FIELDS, KEY_FORCE};
use obf_common::{Error, RedactionRequest, Result, SourceLocator};
use obf_redact::CharsetDetector;

use crate::logging::{event_names, generate_run_id, Level, PipelineEvent, Stage};
use crate::outcome::InvocationResult;
use crate::pipeline::Pipeline;
use crate::storage::ObjectStore;

pub const KEY_RECORDS: &str = "Records";

#[derive(Debug, Deserialize)]
struct RawRecord {
    s3: RawEntity,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    bucket: RawBucket,
    object: RawObject,
}

#[derive(Debug, Deserialize)]
struct RawBucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    key: String,
}

/// One created object, key already URL-decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerRecord {
    pub bucket: String,
    pub key: String,
}

impl TriggerRecord {
    pub fn locator(&self) -> Result<SourceLocator> {
        SourceLocator::new(&self.bucket, &self.key)
    }
}

/// A parsed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerEvent {
    pub records: Vec<TriggerRecord>,
    pub force: Option<bool>,
    pub fields: Option<Vec<String>>,
}

impl TriggerEvent {
    /// Parse and validate a notification.
    ///
    /// `pii_fields` and `force` get the same per-key checks as a request
    /// body, so a wrong type is an `InvalidFieldType`, not a parse failure.
    pub fn from_json(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| Error::MalformedRequest(format!("invalid JSON input: {e}")))?;
        let obj = value
            .as_object()
            .ok_or_else(|| Error::MalformedRequest("notification must be a JSON object".to_string()))?;

        let raw_records = obj
            .get(KEY_RECORDS)
            .ok_or_else(|| Error::MissingField {
                key: KEY_RECORDS.to_string(),
            })?
            .as_array()
            .ok_or_else(|| invalid_type(KEY_RECORDS, "a list of records"))?;
        if raw_records.is_empty() {
            return Err(Error::EmptyValue {
                key: KEY_RECORDS.to_string(),
            });
        }
        let fields = optional_string_list(obj, KEY_FIELDS)?;
        let force = optional_bool(obj, KEY_FORCE)?;

        let records = raw_records
            .iter()
            .enumerate()
            .map(|(idx, raw)| {
                let record = RawRecord::deserialize(raw).map_err(|e| {
                    Error::MalformedRequest(format!("{KEY_RECORDS}[{idx}]: {e}"))
                })?;
                Ok(TriggerRecord {
                    bucket: record.s3.bucket.name,
                    key: decode_key(&record.s3.object.key)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TriggerEvent {
            records,
            force,
            fields,
        })
    }

    /// Field list for every record: the event's own, else `defaults`.
    pub fn fields_or<'a>(&'a self, defaults: &'a [String]) -> &'a [String] {
        self.fields.as_deref().unwrap_or(defaults)
    }

    /// One request per record, in order.
    pub fn requests(&self, defaults: &[String]) -> Vec<Result<RedactionRequest>> {
        let fields = self.fields_or(defaults);
        self.records
            .iter()
            .map(|record| RedactionRequest::new(record.locator()?, fields.to_vec()))
            .collect()
    }
}

/// Decode a notification key: `+` is a space, then percent-decoding.
pub fn decode_key(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|key| key.into_owned())
        .map_err(|e| Error::InvalidLocator(format!("{raw}: {e}")))
}

/// Run every record of `event` through `pipeline`.
pub fn handle_trigger<S: ObjectStore, D: CharsetDetector>(
    pipeline: &Pipeline<S, D>,
    event: &TriggerEvent,
    default_fields: &[String],
) -> Vec<InvocationResult> {
    let trigger_id = generate_run_id();
    let sink = pipeline.sink();
    sink.emit(
        &PipelineEvent::new(
            Level::Info,
            event_names::TRIGGER_RECEIVED,
            trigger_id.as_str(),
            Stage::Validating,
            "notification received",
        )
        .with_field("records", event.records.len())
        .with_field("force", event.force),
    );

    event
        .requests(default_fields)
        .into_iter()
        .enumerate()
        .map(|(idx, request)| {
            let result = request.and_then(|req| pipeline.run(&req, event.force));
            if let Err(err) = &result {
                sink.emit(
                    &PipelineEvent::new(
                        Level::Warn,
                        event_names::TRIGGER_RECORD_FAILED,
                        trigger_id.as_str(),
                        Stage::Validating,
                        err.headline(),
                    )
                    .with_field("record", idx)
                    .with_field("code", err.code()),
                );
            }
            InvocationResult::from(result)
        })
        .collect()
}

/// Parse a raw notification and run it. A notification that cannot be
/// parsed yields a single failed result.
pub fn handle_trigger_json<S: ObjectStore, D: CharsetDetector>(
    pipeline: &Pipeline<S, D>,
    input: &str,
    default_fields: &[String],
) -> Vec<InvocationResult> {
    match TriggerEvent::from_json(input) {
        Ok(event) => handle_trigger(pipeline, &event, default_fields),
        Err(err) => {
            pipeline.sink().emit(
                &PipelineEvent::new(
                    Level::Warn,
                    event_names::TRIGGER_REJECTED,
                    generate_run_id(),
                    Stage::Validating,
                    err.headline(),
                )
                .with_field("code", err.code()),
            );
            vec![InvocationResult::from_error(&err)]
        }
    }
}
