//! Frontmatter parser for rule sources
//!
//! Splits the optional YAML frontmatter from the Markdown body and turns it
//! into a [`Document`]. Parsing is tolerant: malformed frontmatter becomes a
//! diagnostic, never an error, so one bad file cannot abort a run.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::domain::ports::DocumentParser;
use crate::models::{Diagnostic, Document, DocumentAst, DocumentMetadata, Frontmatter, Source};

/// Delimiter for frontmatter sections
const FRONTMATTER_DELIMITER: &str = "---";

/// Frontmatter split out of a source, borrowing from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFrontmatter<'a> {
    /// Everything up to and including the closing delimiter line, verbatim
    pub header: &'a str,
    /// The raw YAML between the delimiters
    pub yaml: &'a str,
    /// The content after the closing delimiter, verbatim
    pub body: &'a str,
    /// 1-indexed line of the closing delimiter
    pub end_line: usize,
}

/// Extract frontmatter from file content
///
/// Frontmatter must be at the start of the file, delimited by `---` lines.
/// Returns `None` when there is no frontmatter or it is never closed.
///
/// # Example
/// ```text
/// ---
/// description: My rule
/// ---
/// # Rule content here
/// ```
pub fn extract_frontmatter(content: &str) -> Option<ExtractedFrontmatter<'_>> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim() != FRONTMATTER_DELIMITER {
        return None;
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for (i, line) in lines.enumerate() {
        if line.trim() == FRONTMATTER_DELIMITER {
            let header_end = offset + line.len();
            return Some(ExtractedFrontmatter {
                header: &content[..header_end],
                yaml: &content[yaml_start..offset],
                body: &content[header_end..],
                end_line: i + 2,
            });
        }
        offset += line.len();
    }
    None
}

fn opens_frontmatter(content: &str) -> bool {
    content
        .lines()
        .next()
        .is_some_and(|line| line.trim() == FRONTMATTER_DELIMITER)
}

/// Parse frontmatter YAML into an open JSON object
///
/// An empty block yields an empty object.
pub fn parse_frontmatter(yaml: &str) -> Result<Frontmatter, Diagnostic> {
    if yaml.trim().is_empty() {
        return Ok(Frontmatter::new());
    }

    match serde_yaml_ng::from_str::<Value>(yaml) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Frontmatter::new()),
        Ok(other) => Err(Diagnostic::error(format!(
            "Frontmatter must be a mapping, found {}",
            json_type_name(&other)
        ))
        .with_tags(["parser", "frontmatter"])
        .with_location(2, 1)),
        Err(err) => Err(yaml_error_diagnostic(yaml, &err)),
    }
}

fn yaml_error_diagnostic(yaml: &str, err: &serde_yaml_ng::Error) -> Diagnostic {
    let err_str = err.to_string();
    let mut diagnostic = Diagnostic::error(format!("Invalid YAML in frontmatter - {err_str}"))
        .with_tags(["parser", "frontmatter"]);

    // YAML starts on line 2, right after the opening delimiter.
    if let Some(location) = err.location() {
        diagnostic = diagnostic.with_location(location.line() + 1, location.column());
    }
    if should_hint_colon_quotes(yaml, &err_str) {
        diagnostic = diagnostic.with_hint("Strings with colons need quotes: description: \"My: Rule\"");
    }
    diagnostic
}

fn should_hint_colon_quotes(yaml: &str, err_str: &str) -> bool {
    // Common YAML parse error when unquoted scalars contain `: `.
    err_str.contains("mapping values are not allowed")
        || err_str.contains("unexpected ':'")
        || yaml
            .lines()
            .any(|l| l.contains(": ") && l.contains("description"))
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

fn frontmatter_version(front_matter: &Frontmatter) -> Option<String> {
    match front_matter.get("version")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Default parser: YAML frontmatter plus a verbatim Markdown body
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontmatterParser;

impl FrontmatterParser {
    /// Parse without going through the port; never fails
    pub fn parse_source(&self, source: &Source) -> Document {
        let mut document = Document::new(source.clone());

        let Some(extracted) = extract_frontmatter(&source.contents) else {
            if opens_frontmatter(&source.contents) {
                document.diagnostics.push(
                    Diagnostic::warning("Frontmatter opened with '---' but never closed")
                        .with_tags(["parser", "frontmatter"])
                        .with_location(1, 1)
                        .with_hint("Add a closing '---' line or remove the opening one"),
                );
            }
            document.ast = DocumentAst {
                body: source.contents.clone(),
                body_start_line: 1,
            };
            return document;
        };

        match parse_frontmatter(extracted.yaml) {
            Ok(front_matter) => {
                document.metadata = DocumentMetadata {
                    version: frontmatter_version(&front_matter),
                    front_matter: Some(front_matter),
                };
            }
            Err(diagnostic) => document.diagnostics.push(diagnostic),
        }
        document.ast = DocumentAst {
            body: extracted.body.to_string(),
            body_start_line: extracted.end_line + 1,
        };
        document
    }
}

impl DocumentParser for FrontmatterParser {
    fn parse(&self, source: &Source) -> anyhow::Result<Document> {
        Ok(self.parse_source(source))
    }
}

/// Read a single rule file into a [`Source`]
///
/// The id is derived from the file name.
pub fn read_source(path: &Path) -> std::io::Result<Source> {
    let contents = fs::read_to_string(path)?;
    Ok(Source::new(derive_id(path), contents).with_path(path))
}

/// Derive a source ID from a file path
///
/// Converts `rules/style-guide.rule.md` to `style-guide`
pub fn derive_id(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    for suffix in [".rule.md", ".ruleset.md"] {
        if let Some(stem) = name.strip_suffix(suffix) {
            return stem.to_string();
        }
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}
