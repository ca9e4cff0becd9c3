//! Field Obfuscator Core Library
//!
//! This library provides the runtime around the redaction engines:
//! - Object storage collaborators (in-memory and directory-backed)
//! - The fetch/redact/write pipeline with conditional overwrite
//! - Object-created notification handling
//! - The caller-facing result surface and CLI exit codes
//! - Structured logging
//!
//! The binary entry point is in `main.rs`.

pub mod exit_codes;
pub mod logging;
pub mod outcome;
pub mod pipeline;
pub mod storage;
pub mod trigger;

pub use outcome::InvocationResult;
pub use pipeline::{Pipeline, PipelineOptions, PipelineOutcome, RedactionResult};
pub use storage::{FsStore, MemoryStore, ObjectStore, StorageError};
pub use trigger::{handle_trigger, handle_trigger_json, TriggerEvent, TriggerRecord};
