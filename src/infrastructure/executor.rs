//! Provider executor
//!
//! Runs a provider's compile step, in-process or through the subprocess
//! sandbox, and turns whatever comes back into [`CompileArtifact`]s. Failures
//! are returned as diagnostics; nothing here panics on provider misbehavior.
//!
//! Subprocess protocol: one JSON object on stdin
//! (`{handshake, input: {document, context, target, projectConfig, rendered}}`),
//! stdin closed, one JSON object on stdout:
//! `{ok: true, artifact}`, `{ok: true, artifacts: [..]}` or
//! `{ok: false, error | diagnostics}`. A non-zero exit status is always a
//! failure.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::ports::{
    Provider, ProviderArtifact, ProviderCompileInput, ProviderHandshake, SandboxMode,
    TargetOverride,
};
use crate::domain::value_objects::normalize_capabilities;
use crate::models::{CompileArtifact, CompileTarget, Diagnostic};

/// A provider compile step that produced no usable artifacts
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFailure {
    /// At least one error-level diagnostic
    pub diagnostics: Vec<Diagnostic>,
}

impl ProviderFailure {
    fn single(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

/// Run a provider for one rendered document
pub fn execute(
    provider: &dyn Provider,
    input: &ProviderCompileInput<'_>,
) -> Result<Vec<CompileArtifact>, ProviderFailure> {
    let handshake = provider.handshake();
    let artifacts = match handshake.sandbox.mode {
        SandboxMode::InProcess => provider
            .compile(input)
            .map(|output| output.into_artifacts())
            .map_err(|err| {
                ProviderFailure::single(
                    Diagnostic::error(format!(
                        "Provider \"{}\" failed: {err:#}",
                        handshake.provider_id
                    ))
                    .with_tags(["provider", handshake.provider_id.as_str()]),
                )
            })?,
        SandboxMode::BunSubprocess => run_subprocess(handshake, input)?,
    };

    Ok(artifacts
        .into_iter()
        .map(|artifact| {
            let target = merge_target(input.target, artifact.target);
            CompileArtifact::new(target, artifact.contents).with_diagnostics(artifact.diagnostics)
        })
        .collect())
}

/// Overlay a provider's target fields on the orchestrator's target
///
/// Unset fields fall back to the orchestrator values; capabilities are
/// normalized either way.
pub fn merge_target(base: &CompileTarget, overrides: Option<TargetOverride>) -> CompileTarget {
    let overrides = overrides.unwrap_or_default();
    let capabilities = overrides
        .capabilities
        .unwrap_or_else(|| base.capabilities.clone());
    CompileTarget {
        provider_id: overrides
            .provider_id
            .unwrap_or_else(|| base.provider_id.clone()),
        output_path: overrides
            .output_path
            .unwrap_or_else(|| base.output_path.clone()),
        capabilities: normalize_capabilities(capabilities),
    }
}

#[derive(Debug, Deserialize)]
struct SandboxResponse {
    ok: bool,
    #[serde(default)]
    artifact: Option<ProviderArtifact>,
    #[serde(default)]
    artifacts: Option<Vec<ProviderArtifact>>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    diagnostics: Vec<Diagnostic>,
}

fn sandbox_error(provider_id: &str, message: String) -> Diagnostic {
    Diagnostic::error(message).with_tags(["provider", provider_id, "sandbox"])
}

/// Request body written to the child's stdin
fn request_payload(handshake: &ProviderHandshake, input: &ProviderCompileInput<'_>) -> Value {
    let document = input.document;
    json!({
        "handshake": handshake,
        "input": {
            "document": {
                "source": document.source,
                "metadata": document.metadata,
                "ast": document.ast,
                "diagnostics": document.diagnostics,
                "dependencies": document.dependencies,
            },
            "context": input.context,
            "target": input.target,
            "projectConfig": input.project_config,
            "rendered": input.rendered,
        },
    })
}

fn run_subprocess(
    handshake: &ProviderHandshake,
    input: &ProviderCompileInput<'_>,
) -> Result<Vec<ProviderArtifact>, ProviderFailure> {
    let provider_id = handshake.provider_id.as_str();
    let sandbox = &handshake.sandbox;
    let fail = |message: String| ProviderFailure::single(sandbox_error(provider_id, message));

    let payload = serde_json::to_vec(&request_payload(handshake, input))
        .map_err(|e| fail(format!("Could not encode sandbox request: {e}")))?;

    let command = sandbox.command();
    let args = sandbox.args();
    debug!(event = "sandbox.spawn", provider_id = %provider_id, command = %command, args = ?args);

    let mut child = Command::new(command)
        .args(&args)
        .current_dir(&input.context.cwd)
        .envs(&input.context.env)
        .envs(&sandbox.env)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            fail(format!(
                "Provider \"{provider_id}\" sandbox could not start `{command}`: {e}"
            ))
        })?;

    // Feed stdin from a separate thread so a chatty child cannot deadlock on
    // a full stdout pipe. Dropping the handle closes the child's stdin.
    let writer = child.stdin.take().map(|mut stdin| {
        std::thread::spawn(move || {
            let _ = stdin.write_all(&payload);
        })
    });

    let output = child.wait_with_output().map_err(|e| {
        fail(format!(
            "Provider \"{provider_id}\" sandbox did not complete: {e}"
        ))
    })?;
    if let Some(writer) = writer {
        let _ = writer.join();
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let mut message = format!("Provider \"{provider_id}\" sandbox exited with {}", output.status);
        if !stderr.is_empty() {
            message.push_str(": ");
            message.push_str(stderr);
        }
        return Err(fail(message));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let response: SandboxResponse = serde_json::from_str(stdout.trim()).map_err(|e| {
        fail(format!(
            "Provider \"{provider_id}\" sandbox wrote an unreadable response: {e}"
        ))
    })?;

    interpret_response(provider_id, response)
}

fn interpret_response(
    provider_id: &str,
    response: SandboxResponse,
) -> Result<Vec<ProviderArtifact>, ProviderFailure> {
    if !response.ok {
        let mut diagnostics = response.diagnostics;
        if let Some(error) = response.error {
            diagnostics.push(sandbox_error(provider_id, error_message(&error)));
        }
        if !diagnostics.iter().any(Diagnostic::is_error) {
            diagnostics.push(sandbox_error(
                provider_id,
                format!("Provider \"{provider_id}\" reported a failure"),
            ));
        }
        return Err(ProviderFailure { diagnostics });
    }

    let mut artifacts = match (response.artifacts, response.artifact) {
        (Some(many), _) => many,
        (None, Some(one)) => vec![one],
        (None, None) => Vec::new(),
    };
    let Some(first) = artifacts.first_mut() else {
        return Err(ProviderFailure::single(sandbox_error(
            provider_id,
            format!("Provider \"{provider_id}\" returned no artifacts"),
        )));
    };
    first.diagnostics.extend(response.diagnostics);
    Ok(artifacts)
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}
