//! Partial resolution
//!
//! Partials come from the directive partial maps and from `{{> name}}`
//! references in the body. Identifiers without a known extension are probed
//! across the partial directories and extensions; the first existing file
//! wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::infrastructure::fs::canonicalize_or_normalize;
use crate::models::{Dependency, DependencyKind, Diagnostic};

/// Directories probed for partials, relative to the working directory
pub const DEFAULT_PARTIAL_DIRS: [&str; 3] =
    [".ruleset/partials", ".ruleset/_mixins", ".ruleset/templates"];

/// Extensions probed, in order
pub const PARTIAL_EXTENSIONS: [&str; 7] = [
    ".rule.md",
    ".ruleset.md",
    ".md",
    ".mdc",
    ".hbs",
    ".handlebars",
    ".txt",
];

/// Partials found for one render call
#[derive(Debug, Default)]
pub struct ResolvedPartials {
    /// Partial name -> template text
    pub templates: BTreeMap<String, String>,
    /// Names that could not be resolved
    pub missing: Vec<String>,
    pub dependencies: Vec<Dependency>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Where to look for partials
#[derive(Debug, Clone)]
pub struct PartialSearch {
    cwd: PathBuf,
    dirs: Vec<PathBuf>,
}

impl PartialSearch {
    /// Default directories followed by `extra_dirs`, all resolved against `cwd`
    pub fn new(cwd: &Path, extra_dirs: &[PathBuf]) -> Self {
        let dirs = DEFAULT_PARTIAL_DIRS
            .iter()
            .map(PathBuf::from)
            .chain(extra_dirs.iter().cloned())
            .map(|dir| cwd.join(dir))
            .collect();
        Self {
            cwd: cwd.to_path_buf(),
            dirs,
        }
    }

    /// Candidate files for an identifier, in probe order
    pub fn candidates(&self, identifier: &str) -> Vec<PathBuf> {
        if has_known_extension(identifier) {
            std::iter::once(self.cwd.join(identifier))
                .chain(self.dirs.iter().map(|dir| dir.join(identifier)))
                .collect()
        } else {
            self.dirs
                .iter()
                .flat_map(|dir| {
                    PARTIAL_EXTENSIONS
                        .iter()
                        .map(move |ext| dir.join(format!("{identifier}{ext}")))
                })
                .collect()
        }
    }

    pub fn find(&self, identifier: &str) -> Option<PathBuf> {
        self.candidates(identifier).into_iter().find(|p| p.is_file())
    }

    /// Resolve the partial map plus any partials referenced in `body`
    ///
    /// Missing or unreadable partials produce a warning and are left out.
    /// Every candidate probed up to and including the match is recorded as a
    /// dependency, so creating a higher-priority or missing partial later
    /// invalidates the render.
    pub fn resolve(
        &self,
        partials: &BTreeMap<String, String>,
        body: &str,
        provider_id: &str,
    ) -> ResolvedPartials {
        let mut wanted = partials.clone();
        for name in referenced_partials(body) {
            wanted.entry(name.clone()).or_insert(name);
        }

        let mut resolved = ResolvedPartials::default();
        for (name, identifier) in wanted {
            let mut found = None;
            for candidate in self.candidates(&identifier) {
                let exists = candidate.is_file();
                resolved.dependencies.push(
                    Dependency::new(DependencyKind::Partial, identifier.clone())
                        .resolved(canonicalize_or_normalize(&candidate)),
                );
                if exists {
                    found = Some(candidate);
                    break;
                }
            }

            let Some(path) = found else {
                resolved.diagnostics.push(
                    Diagnostic::warning(format!(
                        "Partial \"{name}\" not found (looked for \"{identifier}\")"
                    ))
                    .with_tags(["renderer", "handlebars", provider_id, "partials"])
                    .with_hint(format!(
                        "Create it under one of: {}",
                        DEFAULT_PARTIAL_DIRS.join(", ")
                    )),
                );
                resolved.missing.push(name);
                continue;
            };

            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    resolved.templates.insert(name, text);
                }
                Err(err) => {
                    resolved.diagnostics.push(
                        Diagnostic::warning(format!(
                            "Partial \"{name}\" could not be read from {}: {err}",
                            path.display()
                        ))
                        .with_tags(["renderer", "handlebars", provider_id, "partials"]),
                    );
                    resolved.missing.push(name);
                }
            }
        }
        resolved
    }
}

fn has_known_extension(identifier: &str) -> bool {
    PARTIAL_EXTENSIONS.iter().any(|ext| identifier.ends_with(ext))
}

/// Static partial names used as `{{> name}}` or `{{#> name}}`
///
/// Dynamic partials and `@partial-block` are ignored.
pub fn referenced_partials(body: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find("{{") {
        rest = &rest[start + 2..];
        let inner = rest.trim_start_matches('~');
        let inner = inner.strip_prefix('#').unwrap_or(inner);
        let Some(inner) = inner.strip_prefix('>') else {
            continue;
        };
        let inner = inner.trim_start();
        let inner = inner
            .strip_prefix(['"', '\''])
            .unwrap_or(inner);
        let name: String = inner
            .chars()
            .take_while(|c| !c.is_whitespace() && !matches!(c, '}' | '"' | '\'' | '~'))
            .collect();
        if name.is_empty() || name.starts_with('(') || name.starts_with('@') {
            continue;
        }
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
