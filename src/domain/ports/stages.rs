//! Pipeline stage ports
//!
//! Parse, validate and transform are owned by collaborators. Each stage
//! consumes a document and returns a replacement; an `Err` aborts the run.

use crate::config::ProjectConfig;
use crate::models::{Document, Source};

/// Turns a source into a document
pub trait DocumentParser: Send + Sync {
    fn parse(&self, source: &Source) -> anyhow::Result<Document>;
}

/// Checks a parsed document, appending diagnostics
pub trait DocumentValidator: Send + Sync {
    fn validate(
        &self,
        document: Document,
        project_config: Option<&ProjectConfig>,
    ) -> anyhow::Result<Document>;
}

/// Rewrites a validated document before rendering
pub trait DocumentTransformer: Send + Sync {
    fn transform(
        &self,
        document: Document,
        project_config: Option<&ProjectConfig>,
    ) -> anyhow::Result<Document>;
}

/// Transformer that returns the document unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransformer;

impl DocumentTransformer for IdentityTransformer {
    fn transform(
        &self,
        document: Document,
        _project_config: Option<&ProjectConfig>,
    ) -> anyhow::Result<Document> {
        Ok(document)
    }
}
