//! JSON-lines tracing layer.
//!
//! Every event becomes one line on stderr with `ts`, `level`, `event`, the
//! pipeline context keys (`run_id`, `stage`, `source`), an optional `message`
//! and any remaining fields under `fields`. Context keys come from the event
//! itself or, failing that, from the innermost enclosing span.

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::Level;

/// Keys lifted out of `fields` to the top level of each line.
const CONTEXT_KEYS: [&str; 3] = ["run_id", "stage", "source"];

/// Context keys recorded on a span.
#[derive(Debug, Clone, Default)]
struct SpanContext(Map<String, Value>);

/// Collects event or span fields as JSON values.
#[derive(Default)]
struct FieldCollector {
    fields: Map<String, Value>,
    message: Option<String>,
}

impl FieldCollector {
    fn put(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `%value` fields arrive here with Display formatting already applied.
        self.put(field, Value::String(format!("{:?}", value)));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.put(field, Value::Number(n));
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }
}

/// JSONL tracing layer, stderr by default.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    pub fn stderr() -> Self {
        JsonlLayer::new(io::stderr())
    }
}

impl<W: Write> JsonlLayer<W> {
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

fn render(level: Level, target: &str, mut collected: FieldCollector, spans: &[SpanContext]) -> Value {
    let mut line = Map::new();
    line.insert("ts".to_string(), Value::String(Utc::now().to_rfc3339()));
    line.insert("level".to_string(), serde_json::json!(level));

    // Sinks pass the event name as a field; plain macros use the target.
    let name = collected
        .fields
        .remove("event")
        .unwrap_or_else(|| Value::String(target.to_string()));
    line.insert("event".to_string(), name);

    for key in CONTEXT_KEYS {
        let value = collected
            .fields
            .remove(key)
            .or_else(|| spans.iter().find_map(|span| span.0.get(key).cloned()));
        if let Some(value) = value {
            line.insert(key.to_string(), value);
        }
    }
    if let Some(message) = collected.message {
        line.insert("message".to_string(), Value::String(message));
    }

    // Event sinks pre-serialize their field map; splice it back in as JSON.
    let spliced = match collected.fields.get("fields") {
        Some(Value::String(raw)) => serde_json::from_str::<Map<String, Value>>(raw).ok(),
        _ => None,
    };
    if let Some(inner) = spliced {
        collected.fields.remove("fields");
        collected.fields.extend(inner);
    }
    if !collected.fields.is_empty() {
        line.insert("fields".to_string(), Value::Object(collected.fields));
    }
    Value::Object(line)
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut collected = FieldCollector::default();
        attrs.record(&mut collected);
        let context: Map<String, Value> = collected
            .fields
            .into_iter()
            .filter(|(key, _)| CONTEXT_KEYS.contains(&key.as_str()))
            .collect();

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanContext(context));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        // Innermost span first.
        let spans: Vec<SpanContext> = ctx
            .event_scope(event)
            .map(|scope| {
                scope
                    .filter_map(|span| span.extensions().get::<SpanContext>().cloned())
                    .collect()
            })
            .unwrap_or_default();

        let mut collected = FieldCollector::default();
        event.record(&mut collected);

        let metadata = event.metadata();
        let line = render((*metadata.level()).into(), metadata.target(), collected, &spans);
        let json = serde_json::to_string(&line).unwrap_or_default();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", json);
        }
    }
}
