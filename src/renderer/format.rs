//! Output-format stage
//!
//! Runs after templating for every target. Formats are looked up by id,
//! first among the per-call handlers, then in the renderer's registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ProjectConfig;
use crate::models::{CompileArtifact, Diagnostic, Document};
use crate::parser::extract_frontmatter;
use crate::renderer::xml::{markdown_to_xml, XmlOptions};

/// What a format handler can see besides the artifact
#[derive(Debug, Clone, Copy)]
pub struct FormatContext<'a> {
    pub format: &'a str,
    pub provider_id: &'a str,
    pub document: &'a Document,
    pub project_config: Option<&'a ProjectConfig>,
    pub xml: &'a XmlOptions,
}

/// Converts a rendered artifact into its final shape
///
/// Returning `Err` skips the target; the diagnostics explain why.
pub trait OutputFormat: Send + Sync {
    fn apply(
        &self,
        artifact: CompileArtifact,
        context: &FormatContext<'_>,
    ) -> Result<CompileArtifact, Vec<Diagnostic>>;
}

impl<F> OutputFormat for F
where
    F: Fn(CompileArtifact, &FormatContext<'_>) -> Result<CompileArtifact, Vec<Diagnostic>>
        + Send
        + Sync,
{
    fn apply(
        &self,
        artifact: CompileArtifact,
        context: &FormatContext<'_>,
    ) -> Result<CompileArtifact, Vec<Diagnostic>> {
        self(artifact, context)
    }
}

/// Markdown passthrough
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownFormat;

impl OutputFormat for MarkdownFormat {
    fn apply(
        &self,
        artifact: CompileArtifact,
        _context: &FormatContext<'_>,
    ) -> Result<CompileArtifact, Vec<Diagnostic>> {
        Ok(artifact)
    }
}

/// Heading-delimited XML sections
///
/// The frontmatter header is metadata, not content, and is not emitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormat;

impl OutputFormat for XmlFormat {
    fn apply(
        &self,
        mut artifact: CompileArtifact,
        context: &FormatContext<'_>,
    ) -> Result<CompileArtifact, Vec<Diagnostic>> {
        let body = extract_frontmatter(&artifact.contents)
            .map(|extracted| extracted.body)
            .unwrap_or(&artifact.contents);
        let conversion = markdown_to_xml(body, context.xml);
        artifact.contents = conversion.contents;
        artifact.diagnostics.extend(conversion.diagnostics);
        Ok(artifact)
    }
}

/// Registry of output formats by id
#[derive(Clone)]
pub struct FormatRegistry {
    formats: BTreeMap<String, Arc<dyn OutputFormat>>,
}

impl FormatRegistry {
    pub const MARKDOWN: &'static str = "markdown";
    pub const XML: &'static str = "xml";

    /// Registry with the built-in `markdown` and `xml` formats
    pub fn new() -> Self {
        let mut registry = Self {
            formats: BTreeMap::new(),
        };
        registry.register(Self::MARKDOWN, MarkdownFormat);
        registry.register(Self::XML, XmlFormat);
        registry
    }

    /// Add or replace a format
    pub fn register(&mut self, id: impl Into<String>, format: impl OutputFormat + 'static) {
        self.formats.insert(id.into(), Arc::new(format));
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn OutputFormat>> {
        self.formats.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.formats.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.formats.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Diagnostic for a format id nobody registered
pub fn unknown_format_diagnostic(format: &str, provider_id: &str) -> Diagnostic {
    Diagnostic::error(format!(
        "Unknown output format \"{format}\" for provider \"{provider_id}\""
    ))
    .with_tags(["renderer", "format", provider_id])
    .with_hint("Register the format on the renderer or use 'markdown' or 'xml'")
}
