//! Fetch, redact and conditionally write one object.
//!
//! Each run walks `Validating → Fetching → Detecting → Redacting →
//! CheckingTarget → Writing | Skipped` and reports every transition to the
//! injected [`EventSink`]. The existence check and the write are two
//! separate storage calls: two runs racing on the same target can both see
//! it missing, and the later write wins.

use std::sync::Arc;

use serde::Serialize;

use obf_common::{Error, RedactionRequest, Result, SourceLocator};
use obf_config::settings::DEFAULT_OUTPUT_PREFIX;
use obf_config::Settings;
use obf_redact::{
    ChardetDetector, CharsetDetector, EncodingReport, FieldMatcher, Format, MatchReport,
    RedactionEngine,
};

use crate::logging::{event_names, generate_run_id, EventSink, Level, PipelineEvent, Stage, TracingSink};
use crate::storage::ObjectStore;

/// Values resolved once at startup and fixed for the pipeline's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Overwrite policy when neither the caller nor the request decides.
    pub default_overwrite: bool,
    /// Prefix of the output key inside the source's container.
    pub output_prefix: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            default_overwrite: false,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
        }
    }
}

impl From<&Settings> for PipelineOptions {
    fn from(settings: &Settings) -> Self {
        PipelineOptions {
            default_overwrite: settings.default_overwrite(),
            output_prefix: settings.output_prefix.clone(),
        }
    }
}

/// Redacted bytes plus everything learned while producing them.
#[derive(Debug, Clone, Serialize)]
pub struct RedactionResult {
    pub run_id: String,
    pub source: SourceLocator,
    /// Where [`Pipeline::run`] would write.
    pub target: SourceLocator,
    pub format: Format,
    #[serde(skip)]
    pub output: Vec<u8>,
    pub report: MatchReport,
    pub encoding: Option<EncodingReport>,
}

/// Terminal state of a successful run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Written {
        target: SourceLocator,
        bytes: usize,
        report: MatchReport,
        #[serde(skip_serializing_if = "Option::is_none")]
        encoding: Option<EncodingReport>,
    },
    /// Target existed and overwrite was not allowed. Nothing was written.
    Skipped { target: SourceLocator },
}

impl PipelineOutcome {
    pub fn target(&self) -> &SourceLocator {
        match self {
            PipelineOutcome::Written { target, .. } | PipelineOutcome::Skipped { target } => target,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, PipelineOutcome::Written { .. })
    }
}

/// Per-run event context.
struct RunContext<'a> {
    run_id: String,
    stage: Stage,
    sink: &'a dyn EventSink,
}

impl<'a> RunContext<'a> {
    fn new(sink: &'a dyn EventSink) -> Self {
        RunContext {
            run_id: generate_run_id(),
            stage: Stage::Validating,
            sink,
        }
    }

    fn event(&self, level: Level, name: &str, message: impl Into<String>) -> PipelineEvent {
        PipelineEvent::new(level, name, self.run_id.clone(), self.stage, message)
    }

    fn emit(&self, event: PipelineEvent) {
        self.sink.emit(&event);
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.emit(self.event(
            Level::Debug,
            event_names::PIPELINE_STAGE,
            format!("entering {stage}"),
        ));
    }

    fn failed(&self, err: &Error) {
        self.emit(
            self.event(Level::Error, event_names::PIPELINE_FAILED, err.headline())
                .with_field("code", err.code())
                .with_field("category", err.category())
                .with_field("error", err.to_string()),
        );
    }
}

/// The fetch/redact/write pipeline over an [`ObjectStore`].
///
/// `D` is the charset detector used for text payloads without an explicit
/// encoding.
pub struct Pipeline<S, D = ChardetDetector> {
    store: S,
    sink: Arc<dyn EventSink>,
    engine: RedactionEngine<D>,
    options: PipelineOptions,
}

impl<S: ObjectStore> Pipeline<S> {
    /// Pipeline reporting to the global `tracing` subscriber.
    pub fn new(store: S, options: PipelineOptions) -> Self {
        Self::with_sink(store, options, Arc::new(TracingSink))
    }

    pub fn with_sink(store: S, options: PipelineOptions, sink: Arc<dyn EventSink>) -> Self {
        Pipeline::with_engine(store, options, sink, RedactionEngine::new())
    }
}

impl<S: ObjectStore, D: CharsetDetector> Pipeline<S, D> {
    /// Pipeline with a caller-built redaction engine.
    pub fn with_engine(
        store: S,
        options: PipelineOptions,
        sink: Arc<dyn EventSink>,
        engine: RedactionEngine<D>,
    ) -> Self {
        Pipeline {
            store,
            sink,
            engine,
            options,
        }
    }

    /// Where run events go.
    pub fn sink(&self) -> &dyn EventSink {
        self.sink.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Output location for `source`: same container, same file name, under the output prefix.
    pub fn target_for(&self, source: &SourceLocator) -> SourceLocator {
        source.sibling_under(&self.options.output_prefix)
    }

    /// Overwrite decision: explicit `force` > request flag > configured default.
    pub fn should_overwrite(&self, request: &RedactionRequest, force: Option<bool>) -> bool {
        force
            .or(request.force)
            .unwrap_or(self.options.default_overwrite)
    }

    /// Fetch and redact without writing.
    pub fn redact(&self, request: &RedactionRequest) -> Result<RedactionResult> {
        let mut ctx = RunContext::new(self.sink.as_ref());
        self.started(&ctx, request);
        let result = self.redact_in(&mut ctx, request);
        match &result {
            Ok(redacted) => ctx.emit(
                ctx.event(Level::Info, event_names::PIPELINE_FINISHED, "redaction preview ready")
                    .with_field("status", "preview")
                    .with_field("bytes", redacted.output.len()),
            ),
            Err(err) => ctx.failed(err),
        }
        result
    }

    /// Run the full pipeline for one request.
    pub fn run(&self, request: &RedactionRequest, force: Option<bool>) -> Result<PipelineOutcome> {
        let mut ctx = RunContext::new(self.sink.as_ref());
        self.started(&ctx, request);
        let result = self.run_in(&mut ctx, request, force);
        match &result {
            Ok(outcome) => ctx.emit(
                ctx.event(Level::Info, event_names::PIPELINE_FINISHED, "pipeline finished")
                    .with_field("status", if outcome.is_written() { "written" } else { "skipped" })
                    .with_field("target", outcome.target()),
            ),
            Err(err) => ctx.failed(err),
        }
        result
    }

    /// Validate a raw JSON request, then [`run`](Self::run) it.
    pub fn run_json(&self, input: &str, force: Option<bool>) -> Result<PipelineOutcome> {
        match RedactionRequest::from_json(input) {
            Ok(request) => self.run(&request, force),
            Err(err) => {
                let ctx = RunContext::new(self.sink.as_ref());
                ctx.failed(&err);
                Err(err)
            }
        }
    }

    fn started(&self, ctx: &RunContext<'_>, request: &RedactionRequest) {
        ctx.emit(
            ctx.event(Level::Info, event_names::PIPELINE_STARTED, "pipeline started")
                .with_field("source", &request.source)
                .with_field("fields", &request.fields)
                .with_field("store", self.store.name()),
        );
    }

    fn run_in(
        &self,
        ctx: &mut RunContext<'_>,
        request: &RedactionRequest,
        force: Option<bool>,
    ) -> Result<PipelineOutcome> {
        let redacted = self.redact_in(ctx, request)?;
        let target = redacted.target;

        ctx.enter(Stage::CheckingTarget);
        let overwrite = self.should_overwrite(request, force);
        if self.store.exists(&target)? && !overwrite {
            ctx.enter(Stage::Skipped);
            ctx.emit(
                ctx.event(
                    Level::Warn,
                    event_names::WRITE_CONFLICT,
                    "output already exists, skipping write",
                )
                .with_field("target", &target),
            );
            return Ok(PipelineOutcome::Skipped { target });
        }

        ctx.enter(Stage::Writing);
        self.store.put(&target, &redacted.output)?;
        let bytes = redacted.output.len();
        ctx.emit(
            ctx.event(Level::Info, event_names::WRITE_FINISHED, "redacted object written")
                .with_field("target", &target)
                .with_field("bytes", bytes)
                .with_field("overwrite", overwrite),
        );

        Ok(PipelineOutcome::Written {
            target,
            bytes,
            report: redacted.report,
            encoding: redacted.encoding,
        })
    }

    fn redact_in(&self, ctx: &mut RunContext<'_>, request: &RedactionRequest) -> Result<RedactionResult> {
        // Format is decided from the locator alone, before any storage access.
        let format = Format::detect(&request.source)?;
        let matcher = FieldMatcher::new(request.fields.iter())?;
        let target = self.target_for(&request.source);

        ctx.enter(Stage::Fetching);
        let payload = self.store.get(&request.source)?;

        ctx.enter(if format.is_text() {
            Stage::Detecting
        } else {
            Stage::Redacting
        });
        let outcome = self
            .engine
            .redact(format, &payload, &matcher, request.encoding.as_deref())?;

        if let Some(encoding) = &outcome.encoding {
            let level = if encoding.is_low_confidence() {
                Level::Warn
            } else {
                Level::Debug
            };
            let name = if encoding.is_low_confidence() {
                event_names::DETECT_LOW_CONFIDENCE
            } else {
                event_names::DETECT_ENCODING
            };
            ctx.emit(
                ctx.event(level, name, format!("decoded as {}", encoding.encoding))
                    .with_field("encoding", &encoding.encoding)
                    .with_field("confidence", encoding.confidence)
                    .with_field("source", encoding.source),
            );
            ctx.enter(Stage::Redacting);
        }

        if outcome.report.is_partial() {
            ctx.emit(
                ctx.event(
                    Level::Warn,
                    event_names::REDACT_FIELDS_MISSING,
                    "some requested fields were not found",
                )
                .with_field("missing", &outcome.report.missing),
            );
        }
        ctx.emit(
            ctx.event(Level::Info, event_names::REDACT_FINISHED, "payload redacted")
                .with_field("format", format)
                .with_field("records", outcome.report.records_scanned)
                .with_field("cells_masked", outcome.report.cells_masked),
        );

        Ok(RedactionResult {
            run_id: ctx.run_id.clone(),
            source: request.source.clone(),
            target,
            format,
            output: outcome.output,
            report: outcome.report,
            encoding: outcome.encoding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::storage::MemoryStore;

    fn loc(raw: &str) -> SourceLocator {
        SourceLocator::parse(raw).unwrap()
    }

    fn request(raw: &str, fields: &[&str]) -> RedactionRequest {
        RedactionRequest::new(loc(raw), fields.iter().map(|f| f.to_string()).collect()).unwrap()
    }

    fn pipeline(default_overwrite: bool) -> (Pipeline<MemoryStore>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let options = PipelineOptions {
            default_overwrite,
            ..PipelineOptions::default()
        };
        (Pipeline::with_sink(MemoryStore::new(), options, sink.clone()), sink)
    }

    #[test]
    fn test_target_derivation() {
        let (p, _) = pipeline(false);
        assert_eq!(
            p.target_for(&loc("s3://bucket/in/2024/people.csv")).to_string(),
            "s3://bucket/obfuscated/people.csv"
        );
    }

    #[test]
    fn test_overwrite_precedence() {
        let (p, _) = pipeline(true);
        let req = request("s3://bucket/a.csv", &["name"]);
        assert!(p.should_overwrite(&req, None));
        assert!(!p.should_overwrite(&req.clone().with_force(false), None));
        assert!(p.should_overwrite(&req.with_force(false), Some(true)));
    }

    #[test]
    fn test_unsupported_format_fails_before_fetch() {
        let (p, sink) = pipeline(false);
        let err = p.run(&request("s3://bucket/notes.txt", &["name"]), None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
        // Never reached the fetching stage.
        assert!(sink
            .events()
            .iter()
            .all(|e| e.stage == Stage::Validating));
    }

    #[test]
    fn test_run_writes_then_skips() {
        let (p, sink) = pipeline(false);
        let source = loc("s3://bucket/people.csv");
        p.store().insert(&source, "id,name\n1,Ann\n").unwrap();
        let req = request("s3://bucket/people.csv", &["name"]);

        let first = p.run(&req, None).unwrap();
        assert!(first.is_written());
        let target = first.target().clone();
        assert_eq!(p.store().object(&target).unwrap(), b"id,name\n1,***\n");

        let second = p.run(&req, None).unwrap();
        assert!(matches!(second, PipelineOutcome::Skipped { .. }));
        assert!(sink.names().contains(&event_names::WRITE_CONFLICT.to_string()));
    }

    #[test]
    fn test_stage_order() {
        let (p, sink) = pipeline(false);
        p.store()
            .insert(&loc("s3://bucket/people.json"), r#"{"name": "Ann"}"#)
            .unwrap();
        p.run(&request("s3://bucket/people.json", &["name"]), None).unwrap();

        let stages: Vec<Stage> = sink
            .events()
            .iter()
            .filter(|e| e.event == event_names::PIPELINE_STAGE)
            .map(|e| e.stage)
            .collect();
        assert_eq!(
            stages,
            vec![
                Stage::Fetching,
                Stage::Detecting,
                Stage::Redacting,
                Stage::CheckingTarget,
                Stage::Writing
            ]
        );
    }

    #[test]
    fn test_redact_does_not_write() {
        let (p, _) = pipeline(true);
        p.store().insert(&loc("s3://bucket/a.csv"), "id,email\n1,a@b.c\n").unwrap();
        let result = p.redact(&request("s3://bucket/a.csv", &["email"])).unwrap();
        assert_eq!(result.output, b"id,email\n1,***\n");
        assert_eq!(p.store().len(), 1);
    }

    #[test]
    fn test_run_json_rejects_bad_input() {
        let (p, sink) = pipeline(false);
        let err = p.run_json("{not json", None).unwrap_err();
        assert!(matches!(err, Error::MalformedRequest(_)));
        assert_eq!(sink.names(), vec![event_names::PIPELINE_FAILED.to_string()]);
    }
}
