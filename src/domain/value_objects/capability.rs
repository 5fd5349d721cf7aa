//! Capability registry
//!
//! Capabilities are open string ids (`render:handlebars`, `output:sections`,
//! or anything a provider invents). The registry only describes the ids this
//! crate knows about; negotiation never requires an id to be registered.

use serde::Serialize;

/// Well-known capability ids
pub mod ids {
    pub const RENDER_MARKDOWN: &str = "render:markdown";
    pub const RENDER_HANDLEBARS: &str = "render:handlebars";
    pub const RENDER_HANDLEBARS_HELPERS: &str = "render:handlebars:helpers";
    pub const RENDER_HANDLEBARS_PARTIALS: &str = "render:handlebars:partials";
    pub const OUTPUT_SINGLE_FILE: &str = "output:single-file";
    pub const OUTPUT_MULTI_FILE: &str = "output:multi-file";
    pub const OUTPUT_SECTIONS: &str = "output:sections";
    pub const SANDBOX_IN_PROCESS: &str = "sandbox:in-process";
    pub const SANDBOX_BUN_SUBPROCESS: &str = "sandbox:bun-subprocess";
    pub const DIAGNOSTICS_STRUCTURED: &str = "diagnostics:structured";

    /// Prefix shared by every rendering mode
    pub const RENDER_PREFIX: &str = "render:";
    /// Prefix shared by every Handlebars capability
    pub const HANDLEBARS_PREFIX: &str = "render:handlebars";
}

/// Description of an optional feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDescriptor {
    pub id: &'static str,
    pub description: &'static str,
    pub introduced_in: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated_in: Option<&'static str>,
    pub experimental: bool,
    pub requires: &'static [&'static str],
}

const fn descriptor(
    id: &'static str,
    description: &'static str,
    introduced_in: &'static str,
    requires: &'static [&'static str],
) -> CapabilityDescriptor {
    CapabilityDescriptor {
        id,
        description,
        introduced_in,
        deprecated_in: None,
        experimental: false,
        requires,
    }
}

static CAPABILITIES: &[CapabilityDescriptor] = &[
    descriptor(
        ids::RENDER_MARKDOWN,
        "Markdown passthrough rendering",
        "0.1.0",
        &[],
    ),
    descriptor(
        ids::RENDER_HANDLEBARS,
        "Handlebars template rendering",
        "0.1.0",
        &[],
    ),
    descriptor(
        ids::RENDER_HANDLEBARS_HELPERS,
        "Custom Handlebars helper modules",
        "0.1.0",
        &[ids::RENDER_HANDLEBARS],
    ),
    descriptor(
        ids::RENDER_HANDLEBARS_PARTIALS,
        "Handlebars partials resolved from disk",
        "0.1.0",
        &[ids::RENDER_HANDLEBARS],
    ),
    descriptor(
        ids::OUTPUT_SINGLE_FILE,
        "One artifact per source and target",
        "0.1.0",
        &[],
    ),
    descriptor(
        ids::OUTPUT_MULTI_FILE,
        "Several artifacts per source and target",
        "0.1.0",
        &[],
    ),
    descriptor(
        ids::OUTPUT_SECTIONS,
        "Heading-delimited XML section output",
        "0.1.0",
        &[],
    ),
    descriptor(
        ids::SANDBOX_IN_PROCESS,
        "Provider runs inside the orchestrator process",
        "0.1.0",
        &[],
    ),
    CapabilityDescriptor {
        id: ids::SANDBOX_BUN_SUBPROCESS,
        description: "Provider runs in a subprocess speaking JSON over stdio",
        introduced_in: "0.1.0",
        deprecated_in: None,
        experimental: true,
        requires: &[],
    },
    descriptor(
        ids::DIAGNOSTICS_STRUCTURED,
        "Provider reports structured diagnostics",
        "0.1.0",
        &[],
    ),
];

/// Read-only lookup over the built-in capability descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityRegistry;

impl CapabilityRegistry {
    pub fn get(&self, id: &str) -> Option<&'static CapabilityDescriptor> {
        CAPABILITIES.iter().find(|c| c.id == id)
    }

    /// Descriptors for the known ids, in input order; unknown ids are dropped
    pub fn resolve_known<'a, I>(&self, ids: I) -> Vec<&'static CapabilityDescriptor>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn is_known(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn all(&self) -> &'static [CapabilityDescriptor] {
        CAPABILITIES
    }
}

/// Trim, drop empties and deduplicate while keeping first-seen order
pub fn normalize_capabilities<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for id in ids {
        let id = id.as_ref().trim();
        if id.is_empty() || out.iter().any(|existing| existing == id) {
            continue;
        }
        out.push(id.to_string());
    }
    out
}
