//! Provider Port
//!
//! A provider turns a rendered document into provider-specific output.
//! Providers declare what they support through a [`ProviderHandshake`] and
//! either compile in-process or delegate to a sandboxed subprocess.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ProjectConfig, RuntimeContext};
use crate::models::{CompileArtifact, CompileTarget, Diagnostic, Document};

/// Where a provider's compile step runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SandboxMode {
    #[default]
    InProcess,
    BunSubprocess,
}

impl std::fmt::Display for SandboxMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxMode::InProcess => write!(f, "in-process"),
            SandboxMode::BunSubprocess => write!(f, "bun-subprocess"),
        }
    }
}

/// Sandbox settings from the handshake
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxConfig {
    #[serde(default)]
    pub mode: SandboxMode,
    /// Script handed to the runtime when `args` is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Merged over the orchestrator's environment
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl SandboxConfig {
    pub const DEFAULT_COMMAND: &'static str = "bun";

    pub fn subprocess(entry: impl Into<PathBuf>) -> Self {
        Self {
            mode: SandboxMode::BunSubprocess,
            entry: Some(entry.into()),
            ..Self::default()
        }
    }

    pub fn with_command<I, S>(mut self, command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = Some(command.into());
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Program to spawn
    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or(Self::DEFAULT_COMMAND)
    }

    /// Arguments to spawn with: explicit `args`, else `[entry]`
    pub fn args(&self) -> Vec<String> {
        match (&self.args, &self.entry) {
            (Some(args), _) => args.clone(),
            (None, Some(entry)) => vec![entry.display().to_string()],
            (None, None) => Vec::new(),
        }
    }
}

/// What a provider declares about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHandshake {
    pub provider_id: String,
    pub version: String,
    /// Provider SDK version the provider was built against
    pub sdk_version: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

impl ProviderHandshake {
    pub fn new(
        provider_id: impl Into<String>,
        version: impl Into<String>,
        sdk_version: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            version: version.into(),
            sdk_version: sdk_version.into(),
            capabilities: Vec::new(),
            sandbox: SandboxConfig::default(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sandbox(mut self, sandbox: SandboxConfig) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// Everything a provider sees for one (document, target) pair
#[derive(Debug, Clone, Copy)]
pub struct ProviderCompileInput<'a> {
    pub document: &'a Document,
    pub context: &'a RuntimeContext,
    pub target: &'a CompileTarget,
    pub project_config: Option<&'a ProjectConfig>,
    /// Renderer output for this target
    pub rendered: &'a CompileArtifact,
}

/// Target fields a provider may override on its artifacts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
}

/// One artifact as returned by a provider, before target merging
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetOverride>,
    pub contents: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ProviderArtifact {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            ..Self::default()
        }
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.target.get_or_insert_with(TargetOverride::default).output_path = Some(path.into());
        self
    }

    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }
}

/// A provider compile result: one artifact or several
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutput {
    Single(ProviderArtifact),
    Many(Vec<ProviderArtifact>),
}

impl ProviderOutput {
    pub fn into_artifacts(self) -> Vec<ProviderArtifact> {
        match self {
            ProviderOutput::Single(artifact) => vec![artifact],
            ProviderOutput::Many(artifacts) => artifacts,
        }
    }
}

impl From<ProviderArtifact> for ProviderOutput {
    fn from(artifact: ProviderArtifact) -> Self {
        ProviderOutput::Single(artifact)
    }
}

impl From<Vec<ProviderArtifact>> for ProviderOutput {
    fn from(artifacts: Vec<ProviderArtifact>) -> Self {
        ProviderOutput::Many(artifacts)
    }
}

/// A pluggable compiler backend
///
/// Subprocess providers only need a handshake: the executor never calls
/// `compile` for them.
pub trait Provider: Send + Sync {
    /// Declared identity and capabilities
    fn handshake(&self) -> &ProviderHandshake;

    /// Compile one rendered document in-process
    fn compile(&self, input: &ProviderCompileInput<'_>) -> anyhow::Result<ProviderOutput> {
        let _ = input;
        anyhow::bail!(
            "provider '{}' has no in-process compile step",
            self.handshake().provider_id
        )
    }

    fn id(&self) -> &str {
        &self.handshake().provider_id
    }
}
