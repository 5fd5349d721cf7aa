//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure and callers provide concrete implementations.

pub mod compilation_events;
pub mod provider;
pub mod stages;

pub use compilation_events::{CompilationEvent, CompilationEventSink, NoopEventSink, SkipReason};
pub use provider::{
    Provider, ProviderArtifact, ProviderCompileInput, ProviderHandshake, ProviderOutput,
    SandboxConfig, SandboxMode, TargetOverride,
};
pub use stages::{DocumentParser, DocumentTransformer, DocumentValidator, IdentityTransformer};
