//! Structured logging for the obfuscator.
//!
//! The pipeline reports through an [`EventSink`]; the default sink forwards
//! to `tracing`, and the binary renders `tracing` output on stderr either as
//! console lines or as JSONL. stdout stays reserved for payloads and results.
//!
//! Events carry field names, counts and locators, never cell values.

pub mod config;
pub mod events;
pub mod layer;
pub mod sink;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, PipelineEvent, Stage};
pub use layer::JsonlLayer;
pub use sink::{EventSink, MemorySink, TracingSink};

use std::io::IsTerminal;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Filter directive for our crates at the given level.
pub fn filter_directive(level: LogLevel) -> String {
    format!("obf_core={level},obf_redact={level},obf_config={level}")
}

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG` is already folded into `config.level`, so the filter only
/// ever names the obfuscator's crates.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::new(filter_directive(config.level));

    let output: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Jsonl => JsonlLayer::stderr().boxed(),
        LogFormat::Human => {
            let human = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                human.boxed()
            } else {
                human.without_time().boxed()
            }
        }
    };

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init();
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("run-{}", &uuid.simple().to_string()[..12])
}
