//! Template context handed to Handlebars

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::config::{ProjectConfig, RuntimeContext};
use crate::domain::ports::ProviderHandshake;
use crate::models::{CompileTarget, Document};

/// Build the data a template renders against
///
/// Keys: `provider`, `file`, `project`, `env`, `target`, `timestamp`. Keys
/// are always present (possibly null) so strict mode only trips on real
/// typos.
pub fn template_context(
    document: &Document,
    target: &CompileTarget,
    context: &RuntimeContext,
    project_config: Option<&ProjectConfig>,
    provider: Option<&ProviderHandshake>,
) -> Value {
    let front_matter = document
        .metadata
        .front_matter
        .clone()
        .map(Value::Object)
        .unwrap_or_else(|| json!({}));
    let field = |key: &str| front_matter.get(key).cloned().unwrap_or(Value::Null);

    let provider = match provider {
        Some(handshake) => json!({
            "id": handshake.provider_id,
            "version": handshake.version,
            "capabilities": handshake.capabilities,
        }),
        None => json!({
            "id": target.provider_id,
            "version": Value::Null,
            "capabilities": target.capabilities,
        }),
    };

    json!({
        "provider": provider,
        "file": {
            "id": document.source.id,
            "path": document.source.path.as_ref().map(|p| p.display().to_string()),
            "frontmatter": front_matter.clone(),
            "version": document.metadata.version,
            "globs": field("globs"),
            "description": field("description"),
        },
        "project": project_config
            .and_then(|c| serde_json::to_value(c).ok())
            .unwrap_or(Value::Null),
        "env": context.env,
        "target": {
            "providerId": target.provider_id,
            "outputPath": target.output_path.display().to_string(),
            "capabilities": target.capabilities,
        },
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "version": context.version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frontmatter, Source};

    #[test]
    fn context_exposes_file_and_provider() {
        let mut document = Document::new(Source::new("style", "").with_path("rules/style.md"));
        let fm: Frontmatter =
            serde_json::from_value(json!({"description": "Style", "globs": ["*.rs"]})).unwrap();
        document.metadata.front_matter = Some(fm);
        let target = CompileTarget::new("cursor", ".cursor/rules/style.mdc");
        let runtime = RuntimeContext::new("/work").with_env([("CI", "1")]);
        let handshake =
            ProviderHandshake::new("cursor", "2.0.0", "0.1.0").with_capabilities(["render:markdown"]);

        let data = template_context(&document, &target, &runtime, None, Some(&handshake));

        assert_eq!(data["provider"]["version"], "2.0.0");
        assert_eq!(data["provider"]["capabilities"], json!(["render:markdown"]));
        assert_eq!(data["file"]["description"], "Style");
        assert_eq!(data["file"]["globs"], json!(["*.rs"]));
        assert_eq!(data["file"]["path"], "rules/style.md");
        assert_eq!(data["env"]["CI"], "1");
        assert_eq!(data["target"]["outputPath"], ".cursor/rules/style.mdc");
        assert!(data["project"].is_null());
        assert!(data["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn missing_frontmatter_fields_are_null() {
        let document = Document::new(Source::new("a", ""));
        let target = CompileTarget::new("cursor", "a.md");
        let data = template_context(&document, &target, &RuntimeContext::new("."), None, None);

        assert!(data["file"]["description"].is_null());
        assert_eq!(data["file"]["frontmatter"], json!({}));
        assert_eq!(data["provider"]["id"], "cursor");
    }
}
