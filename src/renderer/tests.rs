//! Tests for the renderer

use super::*;
use crate::config::{HandlebarsDirective, ProviderConfig};
use crate::models::{DependencyKind, DiagnosticLevel, Source};
use crate::parser::FrontmatterParser;
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;

fn parse(contents: &str) -> Document {
    FrontmatterParser.parse_source(&Source::new("rule", contents))
}

fn handlebars_target(provider_id: &str) -> CompileTarget {
    CompileTarget::new(provider_id, "out.md").with_capabilities(["render:handlebars"])
}

#[test]
fn test_markdown_passthrough_keeps_header() {
    let doc = parse("---\ndescription: x\n---\n# {{not templated}}\n");
    let runtime = RuntimeContext::new(".");
    let target = CompileTarget::new("cursor", "out.md").with_capabilities(["render:markdown"]);

    let rendered = Renderer::new()
        .render(&doc, &target, &RenderOptions::new(&runtime))
        .unwrap();

    assert_eq!(
        rendered.artifact.contents,
        "---\ndescription: x\n---\n# {{not templated}}\n"
    );
    assert!(rendered.dependencies.is_empty());
}

#[test]
fn test_templates_body_only() {
    let doc = parse("---\ndescription: Style\n---\n{{file.description}} for {{provider.id}}\n");
    let runtime = RuntimeContext::new(".");

    let rendered = Renderer::new()
        .render(&doc, &handlebars_target("cursor"), &RenderOptions::new(&runtime))
        .unwrap();

    assert_eq!(
        rendered.artifact.contents,
        "---\ndescription: Style\n---\nStyle for cursor\n"
    );
}

#[test]
fn test_force_overrides_missing_capability() {
    let doc = parse("---\nrule:\n  handlebars:\n    force: true\n---\n{{uppercase \"hi\"}}");
    let runtime = RuntimeContext::new(".");
    let target = CompileTarget::new("cursor", "out.md");

    let rendered = Renderer::new()
        .render(&doc, &target, &RenderOptions::new(&runtime))
        .unwrap();
    assert!(rendered.artifact.contents.ends_with("HI"));
}

#[test]
fn test_disabled_directive_skips_templating() {
    let doc = parse("---\ncursor:\n  handlebars: false\n---\n{{provider.id}}");
    let runtime = RuntimeContext::new(".");

    let rendered = Renderer::new()
        .render(&doc, &handlebars_target("cursor"), &RenderOptions::new(&runtime))
        .unwrap();
    assert!(rendered.artifact.contents.ends_with("{{provider.id}}"));
}

#[test]
fn test_strict_mode_failure_is_single_error_diagnostic() {
    let doc = parse("{{no_such_variable}}");
    let runtime = RuntimeContext::new(".");

    let failure = Renderer::new()
        .render(&doc, &handlebars_target("cursor"), &RenderOptions::new(&runtime))
        .unwrap_err();

    assert_eq!(failure.diagnostics.len(), 1);
    assert!(failure.diagnostics[0].is_error());
    assert_eq!(failure.diagnostics[0].tag_path(), "renderer/handlebars/cursor");
}

#[test]
fn test_strict_can_be_disabled() {
    let doc = parse("---\nrule:\n  handlebars:\n    strict: false\n---\n[{{no_such_variable}}]");
    let runtime = RuntimeContext::new(".");

    let rendered = Renderer::new()
        .render(&doc, &handlebars_target("cursor"), &RenderOptions::new(&runtime))
        .unwrap();
    assert!(rendered.artifact.contents.ends_with("[]"));
}

#[test]
fn test_escaping_defaults_on() {
    let doc = parse("{{file.description}}");
    let mut doc_with_fm = doc.clone();
    doc_with_fm.metadata.front_matter = serde_json::from_value(json!({"description": "<b>"})).ok();
    let runtime = RuntimeContext::new(".");
    let target = handlebars_target("cursor");

    let escaped = Renderer::new()
        .render(&doc_with_fm, &target, &RenderOptions::new(&runtime))
        .unwrap();
    assert_eq!(escaped.artifact.contents, "&lt;b&gt;");

    let mut config = ProjectConfig::default();
    config.rule.handlebars = Some(HandlebarsDirective {
        no_escape: Some(true),
        ..HandlebarsDirective::default()
    });
    let raw = Renderer::new()
        .render(
            &doc_with_fm,
            &target,
            &RenderOptions::new(&runtime).with_project_config(Some(&config)),
        )
        .unwrap();
    assert_eq!(raw.artifact.contents, "<b>");
}

#[test]
fn test_if_provider_uses_target_provider() {
    let doc = parse(r#"{{#if-provider "windsurf"}}W{{else}}other{{/if-provider}}"#);
    let runtime = RuntimeContext::new(".");
    let renderer = Renderer::new();

    let windsurf = renderer
        .render(&doc, &handlebars_target("windsurf"), &RenderOptions::new(&runtime))
        .unwrap();
    let cursor = renderer
        .render(&doc, &handlebars_target("cursor"), &RenderOptions::new(&runtime))
        .unwrap();
    assert_eq!(windsurf.artifact.contents, "W");
    assert_eq!(cursor.artifact.contents, "other");
}

#[test]
fn test_partials_are_rendered_and_tracked() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join(".ruleset/partials")).unwrap();
    fs::write(
        dir.path().join(".ruleset/partials/header.md"),
        "# Header for {{provider.id}}",
    )
    .unwrap();

    let doc = parse("{{> header}}\nbody");
    let runtime = RuntimeContext::new(dir.path());

    let rendered = Renderer::new()
        .render(&doc, &handlebars_target("cursor"), &RenderOptions::new(&runtime))
        .unwrap();

    assert_eq!(rendered.artifact.contents, "# Header for cursor\nbody");
    // header.rule.md and header.ruleset.md are probed before the match
    assert_eq!(rendered.dependencies.len(), 3);
    assert!(rendered
        .dependencies
        .iter()
        .all(|dep| dep.kind == DependencyKind::Partial));
    assert!(rendered.dependencies[2]
        .resolved_path
        .as_ref()
        .unwrap()
        .ends_with(".ruleset/partials/header.md"));
}

#[test]
fn test_missing_partial_warns_and_continues() {
    let dir = tempdir().unwrap();
    let doc = parse("before {{> nowhere}} after");
    let runtime = RuntimeContext::new(dir.path());

    let rendered = Renderer::new()
        .render(&doc, &handlebars_target("cursor"), &RenderOptions::new(&runtime))
        .unwrap();

    assert_eq!(rendered.artifact.contents, "before  after");
    assert_eq!(rendered.artifact.diagnostics.len(), 1);
    assert_eq!(
        rendered.dependencies.len(),
        DEFAULT_PARTIAL_DIRS.len() * PARTIAL_EXTENSIONS.len()
    );
    assert_eq!(
        rendered.artifact.diagnostics[0].level,
        DiagnosticLevel::Warning
    );
}

#[test]
fn test_helper_modules_from_config() {
    let doc = parse("{{shout \"hey\"}}");
    let runtime = RuntimeContext::new("/project");
    let config = ProjectConfig::default().with_provider(
        "cursor",
        ProviderConfig {
            handlebars: Some(HandlebarsDirective::default().with_helper("./helpers/text.js")),
            ..ProviderConfig::default()
        },
    );
    let renderer = Renderer::new().with_helper_module(
        "./helpers/text.js",
        HelperModule::new().with_named("shout", |params: &[Value]| {
            let text = params.first().and_then(Value::as_str).unwrap_or_default();
            Ok(json!(format!("{}!", text.to_uppercase())))
        }),
    );

    let rendered = renderer
        .render(
            &doc,
            &handlebars_target("cursor"),
            &RenderOptions::new(&runtime).with_project_config(Some(&config)),
        )
        .unwrap();

    assert_eq!(rendered.artifact.contents, "HEY!");
    assert_eq!(rendered.dependencies[0].kind, DependencyKind::Import);
}

#[test]
fn test_unknown_helper_module_is_an_error_diagnostic_not_a_failure() {
    let doc = parse("---\nrule:\n  handlebars:\n    helpers: [\"not-registered\"]\n---\nplain");
    let runtime = RuntimeContext::new(".");

    let rendered = Renderer::new()
        .render(&doc, &handlebars_target("cursor"), &RenderOptions::new(&runtime))
        .unwrap();

    assert!(rendered.artifact.contents.ends_with("plain"));
    assert_eq!(rendered.artifact.diagnostics.len(), 1);
    assert!(rendered.artifact.diagnostics[0].is_error());
}

#[test]
fn test_xml_output_format() {
    let doc = parse("---\ncursor:\n  outputFormat: xml\n---\n## Rules\nBe kind.\n");
    let runtime = RuntimeContext::new(".");
    let target = CompileTarget::new("cursor", "out.xml");

    let rendered = Renderer::new()
        .render(&doc, &target, &RenderOptions::new(&runtime))
        .unwrap();

    assert!(rendered.artifact.contents.starts_with("<?xml"));
    assert!(rendered
        .artifact
        .contents
        .contains("<rules><![CDATA[Be kind.]]></rules>"));
}

#[test]
fn test_unknown_format_is_a_failure() {
    let doc = parse("---\ncursor:\n  outputFormat: yaml\n---\nbody");
    let runtime = RuntimeContext::new(".");
    let target = CompileTarget::new("cursor", "out.yaml");

    let failure = Renderer::new()
        .render(&doc, &target, &RenderOptions::new(&runtime))
        .unwrap_err();

    assert_eq!(failure.diagnostics.len(), 1);
    assert_eq!(failure.diagnostics[0].tag_path(), "renderer/format/cursor");
}

#[test]
fn test_per_call_format_wins_over_registry() {
    let doc = parse("---\ncursor:\n  outputFormat: markdown\n---\nbody");
    let runtime = RuntimeContext::new(".");
    let target = CompileTarget::new("cursor", "out.md");
    let options = RenderOptions::new(&runtime).with_format(
        "markdown",
        |mut artifact: CompileArtifact,
         _ctx: &FormatContext<'_>|
         -> Result<CompileArtifact, Vec<Diagnostic>> {
            artifact.contents = format!("<!-- generated -->\n{}", artifact.contents);
            Ok(artifact)
        },
    );

    let rendered = Renderer::new().render(&doc, &target, &options).unwrap();
    assert!(rendered.artifact.contents.starts_with("<!-- generated -->"));
}

#[test]
fn test_custom_registered_format() {
    let doc = parse("---\ncursor:\n  outputFormat: lines\n---\na\nb");
    let runtime = RuntimeContext::new(".");
    let target = CompileTarget::new("cursor", "out.txt");
    let renderer = Renderer::new().with_format(
        "lines",
        |mut artifact: CompileArtifact,
         ctx: &FormatContext<'_>|
         -> Result<CompileArtifact, Vec<Diagnostic>> {
            let count = artifact.contents.lines().count();
            artifact.contents = format!("{}:{count}", ctx.format);
            Ok(artifact)
        },
    );

    let rendered = renderer
        .render(&doc, &target, &RenderOptions::new(&runtime))
        .unwrap();
    assert_eq!(rendered.artifact.contents, "lines:6");
}
