//! Error types for the compilation orchestrator
//!
//! Only run-fatal conditions are errors. Everything target-scoped travels as
//! a [`Diagnostic`](crate::models::Diagnostic) instead.

use std::fmt;

use thiserror::Error;

use crate::models::Diagnostic;

/// Result type alias for orchestrator operations
pub type RulesetResult<T> = Result<T, RulesetError>;

/// Pipeline stage backed by a caller-replaceable collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Parse,
    Validate,
    Transform,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Parse => write!(f, "parse"),
            PipelineStage::Validate => write!(f, "validate"),
            PipelineStage::Transform => write!(f, "transform"),
        }
    }
}

/// Run-fatal error
#[derive(Error, Debug)]
pub enum RulesetError {
    /// A provider lacks required capabilities and the configured policy
    /// asks for a hard failure.
    #[error(
        "provider '{provider_id}' does not support required capabilities: {} (set by {config_path})",
        missing.join(", ")
    )]
    CapabilityUnsupported {
        provider_id: String,
        missing: Vec<String>,
        /// Config key that turned the missing capability into a failure
        config_path: String,
        diagnostic: Box<Diagnostic>,
    },

    /// A parser, validator or transformer collaborator failed
    #[error("{stage} stage failed for source '{source_id}': {error}")]
    Stage {
        stage: PipelineStage,
        source_id: String,
        #[source]
        error: anyhow::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Filesystem watcher could not be created
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl RulesetError {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            RulesetError::CapabilityUnsupported { .. } => "PROVIDER_CAPABILITY_UNSUPPORTED",
            RulesetError::Stage { .. } => "PIPELINE_STAGE_FAILED",
            RulesetError::Io(_) => "IO_ERROR",
            RulesetError::Watch(_) => "WATCH_FAILED",
        }
    }

    /// Diagnostic attached to the error, if any
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            RulesetError::CapabilityUnsupported { diagnostic, .. } => Some(diagnostic.as_ref()),
            _ => None,
        }
    }
}
