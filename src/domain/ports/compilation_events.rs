//! Compilation Event Port
//!
//! Observable interface for orchestrator runs. Events are strictly ordered:
//! `pipeline:start` first, `pipeline:end` last, and per source/target in
//! pipeline order.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::models::{CompileArtifact, Diagnostic};

/// Why a target produced no artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// The provider lacks required capabilities
    MissingCapability,
    /// The provider's SDK version is not supported
    IncompatibleProvider,
    /// No provider is registered for the target's provider id
    ProviderNotFound,
    /// Templating or output-format conversion failed
    RenderError,
    /// The provider's compile step failed
    ProviderError,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::MissingCapability => "missing-capability",
            SkipReason::IncompatibleProvider => "incompatible-provider",
            SkipReason::ProviderNotFound => "provider-not-found",
            SkipReason::RenderError => "render-error",
            SkipReason::ProviderError => "provider-error",
        };
        f.write_str(s)
    }
}

/// Event emitted during a compilation run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CompilationEvent {
    #[serde(rename = "pipeline:start", rename_all = "camelCase")]
    PipelineStart {
        source_count: usize,
        target_count: usize,
    },

    #[serde(rename = "source:start", rename_all = "camelCase")]
    SourceStart {
        source_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        source_path: Option<PathBuf>,
    },

    /// Diagnostics are the ones added by the parse stage
    #[serde(rename = "source:parsed", rename_all = "camelCase")]
    SourceParsed {
        source_id: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[serde(rename = "source:validated", rename_all = "camelCase")]
    SourceValidated {
        source_id: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[serde(rename = "source:transformed", rename_all = "camelCase")]
    SourceTransformed {
        source_id: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[serde(rename = "target:start", rename_all = "camelCase")]
    TargetStart {
        source_id: String,
        provider_id: String,
        output_path: PathBuf,
    },

    #[serde(rename = "target:capabilities", rename_all = "camelCase")]
    TargetCapabilities {
        source_id: String,
        provider_id: String,
        required: Vec<String>,
        missing: Vec<String>,
    },

    #[serde(rename = "target:cached", rename_all = "camelCase")]
    TargetCached {
        source_id: String,
        provider_id: String,
        artifact_count: usize,
    },

    #[serde(rename = "target:skipped", rename_all = "camelCase")]
    TargetSkipped {
        source_id: String,
        provider_id: String,
        reason: SkipReason,
        diagnostics: Vec<Diagnostic>,
    },

    #[serde(rename = "target:rendered", rename_all = "camelCase")]
    TargetRendered {
        source_id: String,
        provider_id: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[serde(rename = "target:compiled", rename_all = "camelCase")]
    TargetCompiled {
        source_id: String,
        provider_id: String,
        artifact_count: usize,
        diagnostics: Vec<Diagnostic>,
    },

    #[serde(rename = "artifact:emitted", rename_all = "camelCase")]
    ArtifactEmitted {
        source_id: String,
        artifact: CompileArtifact,
    },

    #[serde(rename = "pipeline:end", rename_all = "camelCase")]
    PipelineEnd {
        artifact_count: usize,
        diagnostic_count: usize,
        skipped_count: usize,
    },
}

impl CompilationEvent {
    /// Wire name of the event (`source:start`, ...)
    pub fn kind(&self) -> &'static str {
        match self {
            CompilationEvent::PipelineStart { .. } => "pipeline:start",
            CompilationEvent::SourceStart { .. } => "source:start",
            CompilationEvent::SourceParsed { .. } => "source:parsed",
            CompilationEvent::SourceValidated { .. } => "source:validated",
            CompilationEvent::SourceTransformed { .. } => "source:transformed",
            CompilationEvent::TargetStart { .. } => "target:start",
            CompilationEvent::TargetCapabilities { .. } => "target:capabilities",
            CompilationEvent::TargetCached { .. } => "target:cached",
            CompilationEvent::TargetSkipped { .. } => "target:skipped",
            CompilationEvent::TargetRendered { .. } => "target:rendered",
            CompilationEvent::TargetCompiled { .. } => "target:compiled",
            CompilationEvent::ArtifactEmitted { .. } => "artifact:emitted",
            CompilationEvent::PipelineEnd { .. } => "pipeline:end",
        }
    }
}

/// Trait for receiving compilation events
///
/// Implementations can be:
/// - NdjsonEventSink: NDJSON event stream for CI
/// - the channel sink behind `compile_stream`
/// - any `Fn(&CompilationEvent)` closure
/// - NoopEventSink: Silent operation
pub trait CompilationEventSink: Send + Sync {
    fn on_event(&self, event: &CompilationEvent);
}

/// No-op event sink for silent operation
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl CompilationEventSink for NoopEventSink {
    fn on_event(&self, _event: &CompilationEvent) {}
}

impl<F> CompilationEventSink for F
where
    F: Fn(&CompilationEvent) + Send + Sync,
{
    fn on_event(&self, event: &CompilationEvent) {
        self(event)
    }
}
