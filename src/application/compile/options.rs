//! Compile Options
//!
//! Inputs and collaborators for a compilation run.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{ProjectConfig, RuntimeContext};
use crate::domain::ports::{
    CompilationEventSink, DocumentParser, DocumentTransformer, DocumentValidator,
    IdentityTransformer, NoopEventSink, Provider,
};
use crate::models::{CompileTarget, Source};
use crate::parser::FrontmatterParser;
use crate::renderer::Renderer;
use crate::validation::FrontmatterValidator;

/// What to compile
#[derive(Debug, Clone)]
pub struct CompilationInput {
    pub sources: Vec<Source>,
    /// Every source is compiled against every target
    pub targets: Vec<CompileTarget>,
    pub context: RuntimeContext,
    pub project_config: Option<ProjectConfig>,
    /// File the project config was loaded from; part of the cache hash
    pub project_config_path: Option<PathBuf>,
}

impl CompilationInput {
    pub fn new(context: RuntimeContext) -> Self {
        Self {
            sources: Vec::new(),
            targets: Vec::new(),
            context,
            project_config: None,
            project_config_path: None,
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_sources(mut self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn with_target(mut self, target: CompileTarget) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_project_config(mut self, config: ProjectConfig) -> Self {
        self.project_config = Some(config);
        self
    }

    pub fn with_project_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_config_path = Some(path.into());
        self
    }
}

/// How to compile
///
/// Parser, validator, transformer and renderer default to the crate's own
/// implementations; callers may swap any of them.
#[derive(Clone)]
pub struct CompileOptions {
    pub providers: Vec<Arc<dyn Provider>>,
    /// Changed paths; cache entries depending on them are recompiled
    pub invalidate_paths: Vec<PathBuf>,
    pub event_sink: Arc<dyn CompilationEventSink>,
    pub parser: Arc<dyn DocumentParser>,
    pub validator: Arc<dyn DocumentValidator>,
    pub transformer: Arc<dyn DocumentTransformer>,
    pub renderer: Arc<Renderer>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            invalidate_paths: Vec::new(),
            event_sink: Arc::new(NoopEventSink),
            parser: Arc::new(FrontmatterParser),
            validator: Arc::new(FrontmatterValidator),
            transformer: Arc::new(IdentityTransformer),
            renderer: Arc::new(Renderer::new()),
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn with_providers(mut self, providers: impl IntoIterator<Item = Arc<dyn Provider>>) -> Self {
        self.providers.extend(providers);
        self
    }

    pub fn with_invalidate_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.invalidate_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn CompilationEventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    pub fn with_parser(mut self, parser: impl DocumentParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    pub fn with_validator(mut self, validator: impl DocumentValidator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn with_transformer(mut self, transformer: impl DocumentTransformer + 'static) -> Self {
        self.transformer = Arc::new(transformer);
        self
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }
}
