//! Provider implementations
//!
//! Ready-made [`Provider`]s:
//! - [`PassthroughProvider`]: emits the rendered text as-is
//! - [`FnProvider`]: wraps a closure as an in-process compile step
//! - [`SandboxedProvider`]: a handshake whose compile step runs in a subprocess

use crate::domain::ports::{
    Provider, ProviderArtifact, ProviderCompileInput, ProviderHandshake, ProviderOutput,
    SandboxMode,
};
use crate::domain::services::PROVIDER_SDK_VERSION;
use crate::domain::value_objects::ids;

type CompileFn =
    dyn Fn(&ProviderCompileInput<'_>) -> anyhow::Result<ProviderOutput> + Send + Sync;

/// Provider that returns the renderer output unchanged
#[derive(Debug, Clone)]
pub struct PassthroughProvider {
    handshake: ProviderHandshake,
}

impl PassthroughProvider {
    /// Passthrough provider declaring Markdown, Handlebars and XML support
    pub fn new(provider_id: impl Into<String>) -> Self {
        let handshake = ProviderHandshake::new(provider_id, "1.0.0", PROVIDER_SDK_VERSION)
            .with_capabilities([
                ids::RENDER_MARKDOWN,
                ids::RENDER_HANDLEBARS,
                ids::RENDER_HANDLEBARS_HELPERS,
                ids::RENDER_HANDLEBARS_PARTIALS,
                ids::OUTPUT_SINGLE_FILE,
                ids::OUTPUT_SECTIONS,
                ids::SANDBOX_IN_PROCESS,
            ]);
        Self { handshake }
    }

    pub fn with_handshake(handshake: ProviderHandshake) -> Self {
        Self { handshake }
    }
}

impl Provider for PassthroughProvider {
    fn handshake(&self) -> &ProviderHandshake {
        &self.handshake
    }

    fn compile(&self, input: &ProviderCompileInput<'_>) -> anyhow::Result<ProviderOutput> {
        Ok(ProviderArtifact::new(input.rendered.contents.clone()).into())
    }
}

/// Provider backed by a closure
pub struct FnProvider {
    handshake: ProviderHandshake,
    compile: Box<CompileFn>,
}

impl FnProvider {
    pub fn new<F>(handshake: ProviderHandshake, compile: F) -> Self
    where
        F: Fn(&ProviderCompileInput<'_>) -> anyhow::Result<ProviderOutput> + Send + Sync + 'static,
    {
        Self {
            handshake,
            compile: Box::new(compile),
        }
    }
}

impl std::fmt::Debug for FnProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnProvider")
            .field("handshake", &self.handshake)
            .finish_non_exhaustive()
    }
}

impl Provider for FnProvider {
    fn handshake(&self) -> &ProviderHandshake {
        &self.handshake
    }

    fn compile(&self, input: &ProviderCompileInput<'_>) -> anyhow::Result<ProviderOutput> {
        (self.compile)(input)
    }
}

/// Provider that only exists as a handshake; the executor runs it out of process
#[derive(Debug, Clone)]
pub struct SandboxedProvider {
    handshake: ProviderHandshake,
}

impl SandboxedProvider {
    /// Wrap a handshake, forcing the subprocess sandbox mode
    pub fn new(mut handshake: ProviderHandshake) -> Self {
        handshake.sandbox.mode = SandboxMode::BunSubprocess;
        Self { handshake }
    }
}

impl Provider for SandboxedProvider {
    fn handshake(&self) -> &ProviderHandshake {
        &self.handshake
    }
}
