//! Event Sink Implementations
//!
//! Provides concrete implementations of CompilationEventSink:
//! - NdjsonEventSink: NDJSON output for CI/automation

mod json;

pub use json::NdjsonEventSink;
