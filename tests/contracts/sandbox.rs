//! Sandbox protocol contracts
//!
//! A subprocess provider reads one JSON request on stdin and answers with one
//! JSON response on stdout. A non-zero exit is a failure whatever it printed.

#![cfg(unix)]

use crate::common::*;
use rulesets::{
    compile, CompileOptions, ProviderHandshake, SandboxConfig, SandboxedProvider, SkipReason,
};

fn sandboxed(provider_id: &str, script: &str) -> SandboxedProvider {
    SandboxedProvider::new(
        ProviderHandshake::new(provider_id, "1.0.0", "0.1.0")
            .with_capabilities(["render:markdown"])
            .with_sandbox(SandboxConfig::default().with_command("sh", ["-c", script])),
    )
}

mod protocol {
    use super::*;

    #[test]
    fn contract_subprocess_response_becomes_artifact() {
        let env = TestEnv::new();
        env.write("rules/style.md", PLAIN_RULE);
        let script = r#"cat > /dev/null; printf '%s' '{"ok":true,"artifacts":[{"contents":"one"},{"contents":"two","target":{"outputPath":"out/extra.md"}}]}'"#;
        let options = CompileOptions::new().with_provider(sandboxed("agent", script));

        let output = compile(&env.input("rules/style.md", &["agent"]), &options).unwrap();

        assert!(output.skipped.is_empty());
        assert_eq!(output.artifacts.len(), 2);
        assert_eq!(output.artifacts[0].contents, "one");
        assert_eq!(
            output.artifacts[0].target.output_path,
            std::path::PathBuf::from("out/agent.md")
        );
        assert_eq!(
            output.artifacts[1].target.output_path,
            std::path::PathBuf::from("out/extra.md")
        );
    }

    #[test]
    fn contract_non_zero_exit_skips_target() {
        let env = TestEnv::new();
        env.write("rules/style.md", PLAIN_RULE);
        let script = r#"cat > /dev/null; echo '{"ok":true,"artifact":{"contents":"ignored"}}'; echo 'agent blew up' >&2; exit 1"#;
        let options = CompileOptions::new().with_provider(sandboxed("agent", script));

        let output = compile(&env.input("rules/style.md", &["agent"]), &options).unwrap();

        assert!(output.artifacts.is_empty());
        assert_eq!(output.skipped[0].reason, SkipReason::ProviderError);
        assert!(output.has_errors());
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.message.contains("agent blew up")));
    }

    #[test]
    fn contract_reported_failure_skips_target() {
        let env = TestEnv::new();
        env.write("rules/style.md", PLAIN_RULE);
        let script = r#"cat > /dev/null; printf '%s' '{"ok":false,"error":{"message":"unsupported rule"}}'"#;
        let options = CompileOptions::new().with_provider(sandboxed("agent", script));

        let output = compile(&env.input("rules/style.md", &["agent"]), &options).unwrap();

        assert_eq!(output.skipped[0].reason, SkipReason::ProviderError);
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.is_error() && d.message.contains("unsupported rule")));
    }
}
