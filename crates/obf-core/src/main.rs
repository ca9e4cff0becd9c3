//! Field Obfuscator CLI
//!
//! The main entry point for `obf`, handling:
//! - One-off redaction of a stored object (preview or write)
//! - Raw JSON requests
//! - Object-created notifications
//! - Settings inspection

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use obf_common::{Error, OutputFormat, RedactionRequest, SourceLocator};
use obf_config::{resolve_settings, CliOverrides, ResolvedSettings, RuntimeMode};
use obf_core::exit_codes::ExitCode;
use obf_core::logging::{event_names, init_logging, LogConfig, LogFormat, LogLevel};
use obf_core::{
    handle_trigger_json, FsStore, InvocationResult, Pipeline, PipelineOptions, PipelineOutcome,
};

/// Field Obfuscator - mask PII fields in CSV, JSON and Parquet objects
#[derive(Parser)]
#[command(name = "obf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Settings file (overrides OBF_CONFIG and the XDG location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Runtime mode (development, production)
    #[arg(long, global = true)]
    mode: Option<RuntimeMode>,

    /// Root directory of the object store: objects live at <root>/<bucket>/<key>
    #[arg(long, global = true, env = "OBF_STORE_DIR", default_value = ".")]
    store_dir: PathBuf,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact one object; print it, save it, or write it to the output prefix
    Redact(RedactArgs),

    /// Run a raw JSON request ({"file_to_obfuscate": .., "pii_fields": [..]})
    Request(RequestArgs),

    /// Process an object-created notification
    Trigger(TriggerArgs),

    /// Show resolved settings and where each value came from
    Config,
}

#[derive(Args, Debug)]
struct RedactArgs {
    /// Source locator (s3://bucket/key)
    #[arg(long)]
    source: String,

    /// Fields to mask (repeat or comma-separate)
    #[arg(long, num_args = 1.., value_delimiter = ',', required = true)]
    fields: Vec<String>,

    /// Force a text encoding (e.g. utf-8, utf-16le, latin1)
    #[arg(long)]
    encoding: Option<String>,

    /// Save the redacted payload to this file instead of stdout
    #[arg(long, conflicts_with = "write")]
    output: Option<PathBuf>,

    /// Write the result to the output prefix in the store
    #[arg(long)]
    write: bool,

    /// Overwrite an existing output object
    #[arg(long, requires = "write")]
    force: bool,
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// File holding the JSON request (stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TriggerArgs {
    /// File holding the notification JSON
    #[arg(long)]
    event: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);

    let exit_code = match cli.command {
        Commands::Redact(args) => run_redact(&cli.global, &args),
        Commands::Request(args) => run_request(&cli.global, &args),
        Commands::Trigger(args) => run_trigger(&cli.global, &args),
        Commands::Config => run_config(&cli.global),
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn load_settings(global: &GlobalOpts) -> Result<ResolvedSettings, Error> {
    let overrides = CliOverrides {
        config_path: global.config.clone(),
        mode: global.mode,
        ..CliOverrides::default()
    };
    let resolved = resolve_settings(&overrides)?;
    tracing::debug!(
        event = event_names::CONFIG_LOADED,
        mode = %resolved.settings.mode,
        default_overwrite = resolved.settings.default_overwrite(),
        config_file = ?resolved.config_file,
        "settings resolved"
    );
    Ok(resolved)
}

fn build_pipeline(global: &GlobalOpts, resolved: &ResolvedSettings) -> Pipeline<FsStore> {
    Pipeline::new(
        FsStore::new(&global.store_dir),
        PipelineOptions::from(&resolved.settings),
    )
}

fn run_redact(global: &GlobalOpts, args: &RedactArgs) -> ExitCode {
    let resolved = match load_settings(global) {
        Ok(r) => r,
        Err(e) => return output_error(global, &e),
    };
    let request = match build_request(args) {
        Ok(r) => r,
        Err(e) => return output_error(global, &e),
    };
    let pipeline = build_pipeline(global, &resolved);

    if args.write {
        let force = args.force.then_some(true);
        return match pipeline.run(&request, force) {
            Ok(outcome) => output_outcome(global, &outcome),
            Err(e) => output_error(global, &e),
        };
    }

    let redacted = match pipeline.redact(&request) {
        Ok(r) => r,
        Err(e) => return output_error(global, &e),
    };

    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &redacted.output) {
                return output_error(global, &Error::Io(e));
            }
            match global.format {
                OutputFormat::Json => {
                    let response = serde_json::json!({
                        "status": "ok",
                        "output_path": path,
                        "bytes": redacted.output.len(),
                        "redaction": redacted,
                    });
                    print_json(&response);
                }
                OutputFormat::Summary => {
                    println!(
                        "Obfuscated file written to {} ({} cells masked)",
                        path.display(),
                        redacted.report.cells_masked
                    );
                }
            }
        }
        None => {
            // stdout carries the payload itself.
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(&redacted.output).and_then(|_| stdout.flush()) {
                return output_error(global, &Error::Io(e));
            }
        }
    }

    if !redacted.report.missing.is_empty() {
        eprintln!(
            "warning: fields not found: {}",
            redacted.report.missing.join(", ")
        );
    }
    ExitCode::Ok
}

fn build_request(args: &RedactArgs) -> Result<RedactionRequest, Error> {
    let source = SourceLocator::parse(&args.source)?;
    let fields = args
        .fields
        .iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    let request = RedactionRequest::new(source, fields)?;
    Ok(match &args.encoding {
        Some(encoding) => request.with_encoding(encoding),
        None => request,
    })
}

fn run_request(global: &GlobalOpts, args: &RequestArgs) -> ExitCode {
    let resolved = match load_settings(global) {
        Ok(r) => r,
        Err(e) => return output_error(global, &e),
    };
    let input = match &args.input {
        Some(path) => std::fs::read_to_string(path),
        None => std::io::read_to_string(std::io::stdin()),
    };
    let input = match input {
        Ok(s) => s,
        Err(e) => return output_error(global, &Error::Io(e)),
    };

    let pipeline = build_pipeline(global, &resolved);
    match pipeline.run_json(&input, None) {
        Ok(outcome) => output_outcome(global, &outcome),
        Err(e) => output_error(global, &e),
    }
}

fn run_trigger(global: &GlobalOpts, args: &TriggerArgs) -> ExitCode {
    let resolved = match load_settings(global) {
        Ok(r) => r,
        Err(e) => return output_error(global, &e),
    };
    let input = match std::fs::read_to_string(&args.event) {
        Ok(s) => s,
        Err(e) => return output_error(global, &Error::Io(e)),
    };

    let pipeline = build_pipeline(global, &resolved);
    let results = handle_trigger_json(&pipeline, &input, &resolved.settings.default_fields);

    match global.format {
        OutputFormat::Json => print_json(&results),
        OutputFormat::Summary => {
            for result in &results {
                println!("[{}] {}", result.status_code, result.body);
            }
        }
    }

    exit_code_for_results(&results)
}

/// Worst status across all results decides the exit code.
fn exit_code_for_results(results: &[InvocationResult]) -> ExitCode {
    results
        .iter()
        .map(|r| ExitCode::for_status(r.status_code))
        .max_by_key(|code| code.as_i32())
        .unwrap_or(ExitCode::Ok)
}

fn run_config(global: &GlobalOpts) -> ExitCode {
    let resolved = match load_settings(global) {
        Ok(r) => r,
        Err(e) => return output_error(global, &e),
    };

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "settings": resolved.settings,
                "default_overwrite": resolved.settings.default_overwrite(),
                "sources": resolved.sources,
                "config_file": resolved.config_file,
            });
            print_json(&response);
        }
        OutputFormat::Summary => {
            let s = &resolved.settings;
            println!(
                "mode={} ({}) overwrite={} fields={} prefix={}",
                s.mode,
                resolved.sources.mode,
                s.default_overwrite(),
                s.default_fields.join(","),
                s.output_prefix
            );
        }
    }
    ExitCode::Ok
}

// ============================================================================
// Output helpers
// ============================================================================

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

fn output_outcome(global: &GlobalOpts, outcome: &PipelineOutcome) -> ExitCode {
    let result = InvocationResult::from_outcome(outcome);
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "statusCode": result.status_code,
                "body": result.body,
                "outcome": outcome,
            });
            print_json(&response);
        }
        OutputFormat::Summary => println!("{}", result.body),
    }

    match outcome {
        PipelineOutcome::Written { .. } => ExitCode::Ok,
        PipelineOutcome::Skipped { .. } => ExitCode::Conflict,
    }
}

fn output_error(global: &GlobalOpts, error: &Error) -> ExitCode {
    let exit_code = ExitCode::for_error(error);
    let result = InvocationResult::from_error(error);

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "status": "error",
                "statusCode": result.status_code,
                "exit_code": exit_code.code_name(),
                "error": error.to_report(),
            });
            match serde_json::to_string_pretty(&response) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}", error),
            }
        }
        OutputFormat::Summary => eprintln!("{}", error.format_human()),
    }

    exit_code
}
