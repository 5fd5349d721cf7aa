//! Compile Use Case
//!
//! Runs every source through parse, validate and transform, then every
//! (source, target) pair through:
//! 1. Capability negotiation against the target's provider
//! 2. Cache lookup
//! 3. Rendering
//! 4. Provider execution
//!
//! Target-scoped problems skip only that pair. A capability hard-fail or a
//! failing collaborator stage aborts the run.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use crate::config::RuntimeContext;
use crate::domain::ports::{
    CompilationEvent, CompilationEventSink, Provider, ProviderCompileInput, SkipReason,
};
use crate::domain::services::{
    is_sdk_compatible, missing_capabilities_diagnostic, negotiate,
    should_fail_missing_capabilities, PROVIDER_SDK_VERSION,
};
use crate::domain::value_objects::{normalize_capabilities, ContentHash};
use crate::error::{PipelineStage, RulesetError, RulesetResult};
use crate::infrastructure::cache::{CacheEntry, CacheState, CachedTarget, InvalidationSet};
use crate::infrastructure::executor;
use crate::infrastructure::fs::canonicalize_or_normalize;
use crate::models::{CompileArtifact, CompileTarget, Dependency, Diagnostic, Document, Source};
use crate::renderer::RenderOptions;

use super::options::{CompilationInput, CompileOptions};
use super::result::{CompilationOutput, SkippedTarget, SourceSummary};

/// Compile `input` once
pub fn compile(
    input: &CompilationInput,
    options: &CompileOptions,
) -> RulesetResult<CompilationOutput> {
    CompileUseCase::new(options.clone()).execute(input)
}

/// Compile use case - orchestrates one compilation run
pub struct CompileUseCase {
    options: CompileOptions,
}

impl CompileUseCase {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Execute the use case
    ///
    /// The cache is read once up front and flushed once before
    /// `pipeline:end`. A run-fatal error skips both the flush and
    /// `pipeline:end`.
    pub fn execute(&self, input: &CompilationInput) -> RulesetResult<CompilationOutput> {
        let span = info_span!(
            "rulesets.compile",
            sources = input.sources.len(),
            targets = input.targets.len()
        );
        let _guard = span.enter();

        let cache_dir = input
            .context
            .cache_dir
            .as_deref()
            .map(|dir| input.context.resolve(dir));

        let run = Run {
            input,
            options: &self.options,
            sink: self.options.event_sink.as_ref(),
            providers: provider_table(&self.options.providers),
            cache: CacheState::load(cache_dir.as_deref()),
            invalidated: InvalidationSet::new(&self.options.invalidate_paths, &input.context.cwd),
            output: CompilationOutput::default(),
        };
        run.execute()
    }
}

/// A provider as seen by one run
#[derive(Clone)]
struct ProviderSlot {
    provider: Arc<dyn Provider>,
    /// Declared capabilities, normalized once per run
    capabilities: Vec<String>,
    compatible: bool,
}

/// Providers keyed by id; later registrations replace earlier ones
fn provider_table(providers: &[Arc<dyn Provider>]) -> HashMap<String, ProviderSlot> {
    providers
        .iter()
        .map(|provider| {
            let handshake = provider.handshake();
            let compatible = is_sdk_compatible(&handshake.sdk_version, PROVIDER_SDK_VERSION);
            if !compatible {
                warn!(
                    event = "provider.incompatible",
                    provider_id = %handshake.provider_id,
                    sdk_version = %handshake.sdk_version,
                    supported = PROVIDER_SDK_VERSION,
                );
            }
            let slot = ProviderSlot {
                provider: Arc::clone(provider),
                capabilities: normalize_capabilities(&handshake.capabilities),
                compatible,
            };
            (handshake.provider_id.clone(), slot)
        })
        .collect()
}

/// Per-source bookkeeping
struct SourceState {
    summary: SourceSummary,
    /// Cached entry, only when still valid
    previous: Option<CacheEntry>,
    /// Entry written back to the cache at the end of the source
    entry: CacheEntry,
    dependencies: Vec<PathBuf>,
}

impl SourceState {
    fn add_dependencies(&mut self, dependencies: &[Dependency], context: &RuntimeContext) {
        self.dependencies.extend(
            dependencies
                .iter()
                .filter_map(|dep| dep.resolved_path.as_deref())
                .map(|path| canonicalize_or_normalize(&context.resolve(path))),
        );
    }
}

struct Run<'a> {
    input: &'a CompilationInput,
    options: &'a CompileOptions,
    sink: &'a dyn CompilationEventSink,
    providers: HashMap<String, ProviderSlot>,
    cache: CacheState,
    invalidated: InvalidationSet,
    output: CompilationOutput,
}

impl Run<'_> {
    fn execute(mut self) -> RulesetResult<CompilationOutput> {
        let input = self.input;
        self.emit(CompilationEvent::PipelineStart {
            source_count: input.sources.len(),
            target_count: input.targets.len(),
        });

        for source in &input.sources {
            self.compile_source(source)?;
        }

        self.cache.flush();
        self.emit(CompilationEvent::PipelineEnd {
            artifact_count: self.output.artifacts.len(),
            diagnostic_count: self.output.diagnostics.len(),
            skipped_count: self.output.skipped.len(),
        });
        info!(
            event = "compile.finished",
            artifacts = self.output.artifacts.len(),
            diagnostics = self.output.diagnostics.len(),
            skipped = self.output.skipped.len(),
        );
        Ok(self.output)
    }

    fn emit(&self, event: CompilationEvent) {
        self.sink.on_event(&event);
    }

    /// Append diagnostics to the source-scoped and run-scoped lists
    fn record(&mut self, summary: &mut SourceSummary, diagnostics: &[Diagnostic]) {
        summary.diagnostics.extend_from_slice(diagnostics);
        self.output.diagnostics.extend_from_slice(diagnostics);
    }

    fn compile_source(&mut self, source: &Source) -> RulesetResult<()> {
        let input = self.input;
        let config = input.project_config.as_ref();
        let source_id = source.id.as_str();

        self.emit(CompilationEvent::SourceStart {
            source_id: source_id.to_string(),
            source_path: source.path.clone(),
        });

        let key = source.cache_key();
        let hash = ContentHash::for_source(
            &source.contents,
            &key,
            input.project_config_path.as_deref(),
        );
        let mut state = SourceState {
            summary: SourceSummary::new(source, key),
            previous: None,
            entry: CacheEntry::new(&hash),
            dependencies: Vec::new(),
        };

        let document = self
            .options
            .parser
            .parse(source)
            .map_err(|error| stage_error(PipelineStage::Parse, source_id, error))?;
        let parsed = document.diagnostics.clone();
        self.record(&mut state.summary, &parsed);
        self.emit(CompilationEvent::SourceParsed {
            source_id: source_id.to_string(),
            diagnostics: parsed,
        });

        let seen = document.diagnostics.len();
        let document = self
            .options
            .validator
            .validate(document, config)
            .map_err(|error| stage_error(PipelineStage::Validate, source_id, error))?;
        let validated = diagnostics_since(&document, seen);
        self.record(&mut state.summary, &validated);
        self.emit(CompilationEvent::SourceValidated {
            source_id: source_id.to_string(),
            diagnostics: validated,
        });

        let seen = document.diagnostics.len();
        let document = self
            .options
            .transformer
            .transform(document, config)
            .map_err(|error| stage_error(PipelineStage::Transform, source_id, error))?;
        let transformed = diagnostics_since(&document, seen);
        self.record(&mut state.summary, &transformed);
        self.emit(CompilationEvent::SourceTransformed {
            source_id: source_id.to_string(),
            diagnostics: transformed,
        });

        state.previous = self
            .cache
            .get(&state.summary.source_key)
            .filter(|entry| entry.is_valid(&hash, &self.invalidated))
            .cloned();
        if let Some(previous) = &state.previous {
            // Targets not compiled this run stay reusable.
            state.entry.targets = previous.targets.clone();
            state.dependencies.extend(previous.dependencies.iter().cloned());
        }
        state.entry.diagnostics = document.diagnostics.clone();
        state.add_dependencies(&document.dependencies, &input.context);

        for target in &input.targets {
            self.compile_target(&document, target, &mut state)?;
        }

        let SourceState {
            mut summary,
            mut entry,
            dependencies,
            ..
        } = state;
        entry.set_dependencies(dependencies);
        summary.dependencies = entry.dependencies.clone();
        if self.cache.get(&summary.source_key) != Some(&entry) {
            self.cache.put(summary.source_key.clone(), entry);
        }
        self.output.sources.push(summary);
        Ok(())
    }

    fn compile_target(
        &mut self,
        document: &Document,
        target: &CompileTarget,
        state: &mut SourceState,
    ) -> RulesetResult<()> {
        let input = self.input;
        let config = input.project_config.as_ref();
        let source_id = document.source.id.as_str();
        let provider_id = target.provider_id.as_str();

        self.emit(CompilationEvent::TargetStart {
            source_id: source_id.to_string(),
            provider_id: provider_id.to_string(),
            output_path: target.output_path.clone(),
        });

        let slot = self.providers.get(provider_id).cloned();
        let declared = slot
            .as_ref()
            .map(|slot| slot.capabilities.as_slice())
            .unwrap_or_default();
        let negotiation = negotiate(document, target, declared, config);
        self.emit(CompilationEvent::TargetCapabilities {
            source_id: source_id.to_string(),
            provider_id: provider_id.to_string(),
            required: negotiation.required.clone(),
            missing: negotiation.missing.clone(),
        });

        let Some(slot) = slot else {
            let diagnostic = Diagnostic::error(format!(
                "No provider registered for \"{provider_id}\""
            ))
            .with_tags(["provider", provider_id]);
            self.skip(state, target, SkipReason::ProviderNotFound, vec![diagnostic]);
            return Ok(());
        };

        let handshake = slot.provider.handshake();
        if !slot.compatible {
            let diagnostic = Diagnostic::error(format!(
                "Provider \"{provider_id}\" targets SDK {} which is incompatible with {PROVIDER_SDK_VERSION}",
                handshake.sdk_version
            ))
            .with_tags(["provider", provider_id, "sdk"])
            .with_hint("Upgrade the provider or the orchestrator so their SDK versions match");
            self.skip(state, target, SkipReason::IncompatibleProvider, vec![diagnostic]);
            return Ok(());
        }

        if !negotiation.is_satisfied() {
            let diagnostic = missing_capabilities_diagnostic(provider_id, &negotiation.missing);
            if let Some(config_path) = should_fail_missing_capabilities(provider_id, config) {
                return Err(RulesetError::CapabilityUnsupported {
                    provider_id: provider_id.to_string(),
                    missing: negotiation.missing,
                    config_path,
                    diagnostic: Box::new(diagnostic),
                });
            }
            self.skip(state, target, SkipReason::MissingCapability, vec![diagnostic]);
            return Ok(());
        }

        let cached = state
            .previous
            .as_ref()
            .and_then(|entry| entry.target(provider_id, &target.output_path))
            .cloned();
        if let Some(cached) = cached {
            debug!(event = "cache.hit", source_id = %source_id, provider_id = %provider_id);
            self.record(&mut state.summary, &cached.diagnostics);
            self.emit(CompilationEvent::TargetCached {
                source_id: source_id.to_string(),
                provider_id: provider_id.to_string(),
                artifact_count: cached.artifacts.len(),
            });
            self.emit_artifacts(source_id, &cached.artifacts);
            state.entry.targets.insert(provider_id.to_string(), cached);
            return Ok(());
        }
        debug!(event = "cache.miss", source_id = %source_id, provider_id = %provider_id);

        let resolved = CompileTarget {
            capabilities: negotiation.required,
            ..target.clone()
        };
        let render_options = RenderOptions::new(&input.context)
            .with_project_config(config)
            .with_provider(Some(handshake));
        let rendered = match self.options.renderer.render(document, &resolved, &render_options) {
            Ok(rendered) => rendered,
            Err(failure) => {
                state.add_dependencies(&failure.dependencies, &input.context);
                self.skip(state, target, SkipReason::RenderError, failure.diagnostics);
                return Ok(());
            }
        };
        state.add_dependencies(&rendered.dependencies, &input.context);
        let mut target_diagnostics = rendered.artifact.diagnostics.clone();
        self.record(&mut state.summary, &target_diagnostics);
        self.emit(CompilationEvent::TargetRendered {
            source_id: source_id.to_string(),
            provider_id: provider_id.to_string(),
            diagnostics: target_diagnostics.clone(),
        });

        let compile_input = ProviderCompileInput {
            document,
            context: &input.context,
            target: &resolved,
            project_config: config,
            rendered: &rendered.artifact,
        };
        match executor::execute(slot.provider.as_ref(), &compile_input) {
            Ok(artifacts) => {
                let provider_diagnostics: Vec<Diagnostic> = artifacts
                    .iter()
                    .flat_map(|artifact| artifact.diagnostics.iter().cloned())
                    .collect();
                self.record(&mut state.summary, &provider_diagnostics);
                self.emit(CompilationEvent::TargetCompiled {
                    source_id: source_id.to_string(),
                    provider_id: provider_id.to_string(),
                    artifact_count: artifacts.len(),
                    diagnostics: provider_diagnostics.clone(),
                });
                self.emit_artifacts(source_id, &artifacts);

                target_diagnostics.extend(provider_diagnostics);
                state.entry.targets.insert(
                    provider_id.to_string(),
                    CachedTarget::new(target.output_path.clone(), artifacts)
                        .with_diagnostics(target_diagnostics),
                );
            }
            Err(failure) => {
                self.skip(state, target, SkipReason::ProviderError, failure.diagnostics);
            }
        }
        Ok(())
    }

    fn skip(
        &mut self,
        state: &mut SourceState,
        target: &CompileTarget,
        reason: SkipReason,
        diagnostics: Vec<Diagnostic>,
    ) {
        debug!(
            event = "target.skipped",
            source_id = %state.summary.source_id,
            provider_id = %target.provider_id,
            reason = %reason,
        );
        self.record(&mut state.summary, &diagnostics);
        state.entry.targets.remove(&target.provider_id);
        self.output.skipped.push(SkippedTarget {
            source_id: state.summary.source_id.clone(),
            provider_id: target.provider_id.clone(),
            output_path: target.output_path.clone(),
            reason,
        });
        self.emit(CompilationEvent::TargetSkipped {
            source_id: state.summary.source_id.clone(),
            provider_id: target.provider_id.clone(),
            reason,
            diagnostics,
        });
    }

    fn emit_artifacts(&mut self, source_id: &str, artifacts: &[CompileArtifact]) {
        for artifact in artifacts {
            self.output.artifacts.push(artifact.clone());
            self.emit(CompilationEvent::ArtifactEmitted {
                source_id: source_id.to_string(),
                artifact: artifact.clone(),
            });
        }
    }
}

fn stage_error(stage: PipelineStage, source_id: &str, error: anyhow::Error) -> RulesetError {
    RulesetError::Stage {
        stage,
        source_id: source_id.to_string(),
        error,
    }
}

/// Diagnostics a stage appended after the first `seen`
fn diagnostics_since(document: &Document, seen: usize) -> Vec<Diagnostic> {
    document
        .diagnostics
        .get(seen..)
        .map(<[Diagnostic]>::to_vec)
        .unwrap_or_default()
}
