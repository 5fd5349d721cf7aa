//! Compile Result
//!
//! Result types for compilation runs.

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::ports::SkipReason;
use crate::models::{CompileArtifact, Diagnostic, Source};

/// What one source produced and depends on
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub source_id: String,
    /// Cache key: the source path, else its id
    pub source_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    /// Diagnostics from every stage and target of this source
    pub diagnostics: Vec<Diagnostic>,
    /// Resolved dependency paths, sorted and deduplicated
    pub dependencies: Vec<PathBuf>,
}

impl SourceSummary {
    pub(crate) fn new(source: &Source, source_key: String) -> Self {
        Self {
            source_id: source.id.clone(),
            source_key,
            source_path: source.path.clone(),
            diagnostics: Vec::new(),
            dependencies: Vec::new(),
        }
    }
}

/// A (source, target) pair that produced nothing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedTarget {
    pub source_id: String,
    pub provider_id: String,
    pub output_path: PathBuf,
    pub reason: SkipReason,
}

/// Result of a compilation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationOutput {
    pub artifacts: Vec<CompileArtifact>,
    /// Run-scoped diagnostics, in emission order
    pub diagnostics: Vec<Diagnostic>,
    pub sources: Vec<SourceSummary>,
    pub skipped: Vec<SkippedTarget>,
}

impl CompilationOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Artifacts produced for one provider
    pub fn artifacts_for<'a>(
        &'a self,
        provider_id: &'a str,
    ) -> impl Iterator<Item = &'a CompileArtifact> + 'a {
        self.artifacts
            .iter()
            .filter(move |a| a.target.provider_id == provider_id)
    }
}
