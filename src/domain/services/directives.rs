//! Directive lookup across project config and frontmatter
//!
//! Handlebars directives and output formats can be set in four places.
//! Lookups return them lowest precedence first.

use crate::config::{HandlebarsDirective, ProjectConfig};
use crate::models::Document;

/// Output format used when nothing is configured
pub const DEFAULT_OUTPUT_FORMAT: &str = "markdown";

/// Where a directive was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveOrigin {
    /// Project config `rule.handlebars`
    ProjectRule,
    /// Frontmatter `rule.handlebars`
    FrontmatterRule,
    /// Project config `providers.<id>.handlebars`
    ProjectProvider,
    /// Frontmatter `<providerId>.handlebars`
    FrontmatterProvider,
}

/// Handlebars directives for a provider, lowest precedence first
///
/// Frontmatter values with the wrong shape are ignored here; the validator
/// reports them.
pub fn collect_handlebars_directives(
    document: &Document,
    provider_id: &str,
    config: Option<&ProjectConfig>,
) -> Vec<(DirectiveOrigin, HandlebarsDirective)> {
    let frontmatter_directive = |section: &str| {
        document
            .front_matter_value(section)
            .and_then(|value| value.get("handlebars"))
            .and_then(HandlebarsDirective::from_value)
    };

    let candidates = [
        (
            DirectiveOrigin::ProjectRule,
            config.and_then(|c| c.rule.handlebars.clone()),
        ),
        (DirectiveOrigin::FrontmatterRule, frontmatter_directive("rule")),
        (
            DirectiveOrigin::ProjectProvider,
            config
                .and_then(|c| c.provider(provider_id))
                .and_then(|p| p.handlebars.clone()),
        ),
        (
            DirectiveOrigin::FrontmatterProvider,
            frontmatter_directive(provider_id),
        ),
    ];

    candidates
        .into_iter()
        .filter_map(|(origin, directive)| directive.map(|d| (origin, d)))
        .collect()
}

/// Output format for a provider
///
/// Frontmatter `<providerId>.outputFormat` overrides project
/// `providers.<id>.outputFormat`; defaults to `markdown`.
pub fn resolve_output_format(
    document: &Document,
    provider_id: &str,
    config: Option<&ProjectConfig>,
) -> String {
    document
        .front_matter_value(provider_id)
        .and_then(|value| value.get("outputFormat"))
        .and_then(|value| value.as_str())
        .or_else(|| {
            config
                .and_then(|c| c.provider(provider_id))
                .and_then(|p| p.output_format.as_deref())
        })
        .unwrap_or(DEFAULT_OUTPUT_FORMAT)
        .to_string()
}
