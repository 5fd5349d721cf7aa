//! Rulesets - compilation orchestrator for Markdown rulesets
//!
//! Turns Markdown rule documents into provider-specific artifacts for AI
//! coding assistants. A run parses, validates and transforms each source,
//! negotiates capabilities with every target's provider, renders the
//! document (optionally through Handlebars, then into an output format) and
//! hands the result to the provider, either in-process or through a
//! subprocess sandbox. Results are cached by content hash, and a watch
//! driver recompiles on change.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod parser;
pub mod renderer;
pub mod validation;

// Re-exports for convenience
pub use application::{
    compile, compile_stream, watch, watch_compilation, CompilationInput, CompilationOutput,
    CompilationStream, CompileOptions, WatchDriver, WatchOptions, WatchRun,
};
pub use config::{BuildConfig, HandlebarsDirective, ProjectConfig, ProviderConfig, RuntimeContext};
pub use domain::ports::{
    CompilationEvent, CompilationEventSink, Provider, ProviderArtifact, ProviderCompileInput,
    ProviderHandshake, ProviderOutput, SandboxConfig, SandboxMode, SkipReason,
};
pub use error::{RulesetError, RulesetResult};
pub use infrastructure::{FnProvider, NdjsonEventSink, PassthroughProvider, SandboxedProvider};
pub use models::{
    CompileArtifact, CompileTarget, Dependency, DependencyKind, Diagnostic, DiagnosticLevel,
    Document, Source,
};
pub use parser::{FrontmatterParser, read_source};
pub use renderer::{HelperModule, OutputFormat, Renderer};
pub use validation::FrontmatterValidator;
