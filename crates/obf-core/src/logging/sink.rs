//! Event sinks: where the pipeline sends its [`PipelineEvent`]s.

use std::sync::Mutex;

use super::events::{Level, PipelineEvent};

/// Receiver for pipeline events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &PipelineEvent);
}

/// Forwards events to the global `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &PipelineEvent) {
        let fields = if event.fields.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&event.fields).unwrap_or_default()
        };
        macro_rules! forward {
            ($macro:ident) => {
                tracing::$macro!(
                    target: "obf_core::pipeline",
                    event = %event.event,
                    run_id = %event.run_id,
                    stage = %event.stage,
                    fields = %fields,
                    message = %event.message,
                )
            };
        }
        match event.level {
            Level::Trace => forward!(trace),
            Level::Debug => forward!(debug),
            Level::Info => forward!(info),
            Level::Warn => forward!(warn),
            Level::Error => forward!(error),
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Names of the emitted events, in order.
    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event).collect()
    }

    /// All emitted events rendered as JSONL.
    pub fn to_jsonl(&self) -> String {
        self.events()
            .iter()
            .map(|e| e.to_jsonl() + "\n")
            .collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
