//! Capability negotiation
//!
//! Derives the capabilities a (document, target) pair requires and checks
//! them against what a provider declares. Works on raw string ids; the
//! registry is only consulted to describe missing capabilities.

use crate::config::ProjectConfig;
use crate::domain::services::directives::{collect_handlebars_directives, resolve_output_format};
use crate::domain::value_objects::{ids, normalize_capabilities, CapabilityRegistry};
use crate::models::{CompileTarget, Diagnostic, Document};

/// Provider SDK version this orchestrator speaks
pub const PROVIDER_SDK_VERSION: &str = "0.1.0";

/// Result of negotiating one target against one provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Negotiation {
    /// Final required set, deduplicated, in derivation order
    pub required: Vec<String>,
    /// Required ids the provider does not declare
    pub missing: Vec<String>,
}

impl Negotiation {
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Negotiate a target's required capabilities against a provider's declared ones
pub fn negotiate(
    document: &Document,
    target: &CompileTarget,
    declared: &[String],
    config: Option<&ProjectConfig>,
) -> Negotiation {
    let required = derive_required_capabilities(document, target, config);
    let missing = find_missing(&required, declared);
    Negotiation { required, missing }
}

/// Required capabilities for a (document, target) pair
///
/// Starts from the target's explicit list and adds what templating,
/// helpers, partials and the output format imply.
pub fn derive_required_capabilities(
    document: &Document,
    target: &CompileTarget,
    config: Option<&ProjectConfig>,
) -> Vec<String> {
    let mut required = normalize_capabilities(&target.capabilities);
    let directives = collect_handlebars_directives(document, &target.provider_id, config);

    // Later sources override `enabled`; `force` from any source turns it on.
    let directive_enabled = directives
        .iter()
        .filter_map(|(_, d)| d.enabled)
        .last()
        .unwrap_or(false);
    let forced = directives.iter().any(|(_, d)| d.force == Some(true));
    let requires_handlebars = document.source.template == Some(true)
        || document.rule_template_flag()
        || directive_enabled
        || forced;

    if requires_handlebars {
        required.push(ids::RENDER_HANDLEBARS.to_string());
    } else if !required.iter().any(|c| c.starts_with(ids::RENDER_PREFIX)) {
        required.push(ids::RENDER_MARKDOWN.to_string());
    }

    if directives.iter().any(|(_, d)| !d.helpers.is_empty()) {
        required.push(ids::RENDER_HANDLEBARS_HELPERS.to_string());
    }
    if directives.iter().any(|(_, d)| !d.partials.is_empty()) {
        required.push(ids::RENDER_HANDLEBARS_PARTIALS.to_string());
    }

    if resolve_output_format(document, &target.provider_id, config) == "xml" {
        required.push(ids::OUTPUT_SECTIONS.to_string());
    }

    normalize_capabilities(required)
}

/// `required - declared`, keeping the order of `required`
pub fn find_missing(required: &[String], declared: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|id| !declared.contains(id))
        .cloned()
        .collect()
}

/// Error diagnostic describing a provider's missing capabilities
pub fn missing_capabilities_diagnostic(provider_id: &str, missing: &[String]) -> Diagnostic {
    let registry = CapabilityRegistry;
    let (known, unknown): (Vec<&String>, Vec<&String>) =
        missing.iter().partition(|id| registry.is_known(id));

    let mut message = format!("Provider \"{provider_id}\" does not support required capabilities");
    if !known.is_empty() {
        let described: Vec<String> = known
            .iter()
            .filter_map(|id| registry.get(id))
            .map(|desc| format!("{} ({})", desc.id, desc.description))
            .collect();
        message.push_str(&format!(": {}", described.join(", ")));
    }
    if !unknown.is_empty() {
        let unknown: Vec<&str> = unknown.iter().map(|id| id.as_str()).collect();
        message.push_str(&format!("; unrecognized: {}", unknown.join(", ")));
    }

    Diagnostic::error(message)
        .with_tags(["provider", provider_id, "capabilities"])
        .with_hint(format!(
            "Disable the features that need them for '{provider_id}', or upgrade the provider"
        ))
}

/// Config key that turns missing capabilities into a run failure
///
/// `providers.<id>.failOnMissingCapabilities` overrides
/// `build.failOnMissingCapabilities`. Returns `None` when the target should
/// only be skipped.
pub fn should_fail_missing_capabilities(
    provider_id: &str,
    config: Option<&ProjectConfig>,
) -> Option<String> {
    let config = config?;
    if let Some(flag) = config
        .provider(provider_id)
        .and_then(|p| p.fail_on_missing_capabilities)
    {
        return flag.then(|| format!("providers.{provider_id}.failOnMissingCapabilities"));
    }
    config
        .build
        .fail_on_missing_capabilities
        .then(|| "build.failOnMissingCapabilities".to_string())
}

/// Whether a provider built against `declared` works with `supported`
///
/// Majors must match; below 1.0 minors must match too.
pub fn is_sdk_compatible(declared: &str, supported: &str) -> bool {
    match (parse_major_minor(declared), parse_major_minor(supported)) {
        (Some((major, minor)), Some((want_major, want_minor))) => {
            major == want_major && (major != 0 || minor == want_minor)
        }
        _ => false,
    }
}

fn parse_major_minor(version: &str) -> Option<(u64, u64)> {
    let version = version.trim().trim_start_matches('v');
    let core = version.split(['-', '+']).next()?;
    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |m| m.parse().ok())?;
    Some((major, minor))
}
