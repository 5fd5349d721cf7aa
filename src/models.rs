//! Core data models
//!
//! Defines the data shapes that flow through the orchestrator:
//! - `Source`: caller-supplied Markdown input
//! - `Document`: a parsed source plus its metadata, diagnostics and dependencies
//! - `CompileTarget` / `CompileArtifact`: what to build and what was built
//! - `Diagnostic`: non-fatal findings attached to documents and artifacts

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parsed YAML frontmatter, kept as an open JSON object
pub type Frontmatter = Map<String, Value>;

/// Kind of source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// A single rule file
    #[default]
    Rule,
    /// A ruleset bundling several rules
    Ruleset,
}

/// One input Markdown document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub contents: String,
    #[serde(default)]
    pub format: SourceFormat,
    /// Forces Handlebars templating for this source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<bool>,
}

impl Source {
    pub fn new(id: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: None,
            contents: contents.into(),
            format: SourceFormat::default(),
            template: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_template(mut self, template: bool) -> Self {
        self.template = Some(template);
        self
    }

    /// Key used by the compilation cache: the path when known, else the id
    pub fn cache_key(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => self.id.clone(),
        }
    }
}

/// Kind of external file a document depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Partial,
    Import,
    Template,
    Asset,
}

/// External file a document's rendering depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub kind: DependencyKind,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<PathBuf>,
}

impl Dependency {
    pub fn new(kind: DependencyKind, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
            resolved_path: None,
        }
    }

    pub fn resolved(mut self, path: impl Into<PathBuf>) -> Self {
        self.resolved_path = Some(path.into());
        self
    }
}

/// Document metadata extracted from frontmatter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_matter: Option<Frontmatter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Parsed document body
///
/// The Markdown grammar itself is owned by the parser collaborator; the
/// orchestrator only needs the body and where it starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAst {
    pub body: String,
    /// 1-indexed line where the body starts in the source
    pub body_start_line: usize,
}

/// A parsed source document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub source: Source,
    pub metadata: DocumentMetadata,
    pub ast: DocumentAst,
    pub diagnostics: Vec<Diagnostic>,
    pub dependencies: Vec<Dependency>,
}

impl Document {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            metadata: DocumentMetadata::default(),
            ast: DocumentAst::default(),
            diagnostics: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Top-level frontmatter value by key
    pub fn front_matter_value(&self, key: &str) -> Option<&Value> {
        self.metadata
            .front_matter
            .as_ref()
            .and_then(|fm| fm.get(key))
    }

    /// `rule.template` from frontmatter
    pub fn rule_template_flag(&self) -> bool {
        self.front_matter_value("rule")
            .and_then(|rule| rule.get("template"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Info => write!(f, "info"),
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Error => write!(f, "error"),
        }
    }
}

/// Position inside a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticLocation {
    pub line: usize,
    pub column: usize,
}

/// Non-fatal finding surfaced to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<DiagnosticLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            tags: Vec::new(),
            location: None,
            hint: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, message)
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.location = Some(DiagnosticLocation { line, column });
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }

    /// Tags joined with `/`, e.g. `renderer/handlebars/cursor`
    pub fn tag_path(&self) -> String {
        self.tags.join("/")
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tags.is_empty() {
            write!(f, "{}: {}", self.level, self.message)
        } else {
            write!(f, "{} [{}]: {}", self.level, self.tag_path(), self.message)
        }
    }
}

/// A (provider, output path) pair a source is compiled against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileTarget {
    pub provider_id: String,
    pub output_path: PathBuf,
    /// Capabilities this target requires
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
}

impl CompileTarget {
    pub fn new(provider_id: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            provider_id: provider_id.into(),
            output_path: output_path.into(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

/// Compiled output for one (source, target) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileArtifact {
    pub target: CompileTarget,
    pub contents: String,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileArtifact {
    pub fn new(target: CompileTarget, contents: impl Into<String>) -> Self {
        Self {
            target,
            contents: contents.into(),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}
