//! Renderer
//!
//! Turns a parsed document into the text handed to a provider:
//! 1. Split off the frontmatter header (reattached verbatim afterwards)
//! 2. Optionally run the body through Handlebars
//! 3. Run the output-format stage (`markdown`, `xml` or a custom format)
//!
//! Rendering never panics or returns a run-fatal error; failures come back
//! as [`RenderFailure`] carrying diagnostics.

pub mod context;
pub mod format;
pub mod helpers;
pub mod partials;
pub mod settings;
pub mod xml;

use std::collections::BTreeMap;
use std::sync::Arc;

use handlebars::Handlebars;

use crate::config::{ProjectConfig, RuntimeContext};
use crate::domain::ports::ProviderHandshake;
use crate::domain::services::{collect_handlebars_directives, resolve_output_format};
use crate::models::{CompileArtifact, CompileTarget, Dependency, Diagnostic, Document};
use crate::parser::extract_frontmatter;

pub use format::{FormatContext, FormatRegistry, MarkdownFormat, OutputFormat, XmlFormat};
pub use helpers::{HelperFn, HelperModule, HelperRegistry};
pub use partials::{PartialSearch, DEFAULT_PARTIAL_DIRS, PARTIAL_EXTENSIONS};
pub use settings::HandlebarsSettings;
pub use xml::{markdown_to_xml, XmlConversion, XmlOptions};

/// Per-call render inputs
#[derive(Clone)]
pub struct RenderOptions<'a> {
    pub context: &'a RuntimeContext,
    pub project_config: Option<&'a ProjectConfig>,
    /// Handshake of the target's provider, exposed to templates
    pub provider: Option<&'a ProviderHandshake>,
    /// One-off format handlers, consulted before the renderer's registry
    pub formats: BTreeMap<String, Arc<dyn OutputFormat>>,
    pub xml: XmlOptions,
}

impl<'a> RenderOptions<'a> {
    pub fn new(context: &'a RuntimeContext) -> Self {
        Self {
            context,
            project_config: None,
            provider: None,
            formats: BTreeMap::new(),
            xml: XmlOptions::default(),
        }
    }

    pub fn with_project_config(mut self, config: Option<&'a ProjectConfig>) -> Self {
        self.project_config = config;
        self
    }

    pub fn with_provider(mut self, provider: Option<&'a ProviderHandshake>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_format(mut self, id: impl Into<String>, format: impl OutputFormat + 'static) -> Self {
        self.formats.insert(id.into(), Arc::new(format));
        self
    }

    pub fn with_xml(mut self, xml: XmlOptions) -> Self {
        self.xml = xml;
        self
    }
}

/// Successful render: the artifact plus files its rendering read
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedArtifact {
    pub artifact: CompileArtifact,
    pub dependencies: Vec<Dependency>,
}

/// Failed render
///
/// Holds every diagnostic collected before the failure, the failure itself
/// last.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFailure {
    pub diagnostics: Vec<Diagnostic>,
    pub dependencies: Vec<Dependency>,
}

/// Document renderer
///
/// Owns the format registry and helper modules; cheap to share behind an
/// `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    formats: FormatRegistry,
    helpers: HelperRegistry,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom output format for every render call
    pub fn with_format(mut self, id: impl Into<String>, format: impl OutputFormat + 'static) -> Self {
        self.formats.register(id, format);
        self
    }

    /// Register a helper module under a specifier
    pub fn with_helper_module(mut self, specifier: impl Into<String>, module: HelperModule) -> Self {
        self.helpers.register(specifier, module);
        self
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }

    /// Render a document for one target
    pub fn render(
        &self,
        document: &Document,
        target: &CompileTarget,
        options: &RenderOptions<'_>,
    ) -> Result<RenderedArtifact, RenderFailure> {
        let provider_id = target.provider_id.as_str();
        let directives =
            collect_handlebars_directives(document, provider_id, options.project_config);
        let settings = HandlebarsSettings::aggregate(&directives);

        let mut diagnostics = Vec::new();
        let mut dependencies = Vec::new();

        let contents = document.source.contents.as_str();
        let (header, body) = match extract_frontmatter(contents) {
            Some(extracted) => (extracted.header, extracted.body),
            None => ("", contents),
        };

        let body = if settings.should_template(&target.capabilities) {
            match self.render_template(
                body,
                document,
                target,
                options,
                &settings,
                &mut diagnostics,
                &mut dependencies,
            ) {
                Ok(rendered) => rendered,
                Err(failure) => {
                    diagnostics.push(failure);
                    return Err(RenderFailure {
                        diagnostics,
                        dependencies,
                    });
                }
            }
        } else {
            body.to_string()
        };

        let artifact = CompileArtifact::new(target.clone(), format!("{header}{body}"))
            .with_diagnostics(diagnostics);

        let format = resolve_output_format(document, provider_id, options.project_config);
        let format_context = FormatContext {
            format: &format,
            provider_id,
            document,
            project_config: options.project_config,
            xml: &options.xml,
        };
        let handler = options
            .formats
            .get(&format)
            .or_else(|| self.formats.get(&format));

        let Some(handler) = handler else {
            let mut diagnostics = artifact.diagnostics;
            diagnostics.push(format::unknown_format_diagnostic(&format, provider_id));
            return Err(RenderFailure {
                diagnostics,
                dependencies,
            });
        };

        // Handlers get a copy so earlier diagnostics survive a failing format.
        let collected = artifact.diagnostics.clone();
        match handler.apply(artifact, &format_context) {
            Ok(artifact) => Ok(RenderedArtifact {
                artifact,
                dependencies,
            }),
            Err(errors) => {
                let mut diagnostics = collected;
                diagnostics.extend(errors);
                Err(RenderFailure {
                    diagnostics,
                    dependencies,
                })
            }
        }
    }

    /// Template the body; `Err` is the single failure diagnostic
    #[allow(clippy::too_many_arguments)]
    fn render_template(
        &self,
        body: &str,
        document: &Document,
        target: &CompileTarget,
        options: &RenderOptions<'_>,
        settings: &HandlebarsSettings,
        diagnostics: &mut Vec<Diagnostic>,
        dependencies: &mut Vec<Dependency>,
    ) -> Result<String, Diagnostic> {
        let provider_id = target.provider_id.as_str();
        let cwd = options.context.cwd.as_path();
        let fail = |message: String| {
            Diagnostic::error(format!("Handlebars rendering failed: {message}"))
                .with_tags(["renderer", "handlebars", provider_id])
        };

        let mut registry = Handlebars::new();
        registry.set_strict_mode(settings.strict);
        if settings.no_escape {
            registry.register_escape_fn(handlebars::no_escape);
        }
        helpers::register_builtins(&mut registry);

        let loaded = self.helpers.load(&settings.helpers, cwd, provider_id);
        diagnostics.extend(loaded.diagnostics);
        dependencies.extend(loaded.dependencies);
        for (name, func) in loaded.helpers {
            registry.register_helper(&name, Box::new(helpers::ClosureHelper::new(&name, func)));
        }

        let partial_dirs = options
            .project_config
            .map(|c| c.rule.partial_dirs.as_slice())
            .unwrap_or_default();
        let partials =
            PartialSearch::new(cwd, partial_dirs).resolve(&settings.partials, body, provider_id);
        diagnostics.extend(partials.diagnostics);
        dependencies.extend(partials.dependencies);
        for (name, template) in &partials.templates {
            registry
                .register_partial(name, template)
                .map_err(|e| fail(format!("partial \"{name}\": {e}")))?;
        }
        // Unresolved partials render as nothing instead of failing the template.
        for name in &partials.missing {
            registry
                .register_partial(name, "")
                .map_err(|e| fail(format!("partial \"{name}\": {e}")))?;
        }

        let data = context::template_context(
            document,
            target,
            options.context,
            options.project_config,
            options.provider,
        );
        registry
            .render_template(body, &data)
            .map_err(|e| fail(e.to_string()))
    }
}

#[cfg(test)]
mod tests;
