//! Capability contracts
//!
//! A target whose provider lacks a required capability is skipped, unless
//! configuration turns the gap into a run-fatal error.

use crate::common::*;
use rulesets::{
    compile, BuildConfig, CompilationEvent, CompileOptions, PassthroughProvider, ProjectConfig,
    ProviderConfig, ProviderHandshake, SkipReason,
};

const TEMPLATED: &str = "---\nrule:\n  template: true\n---\nHello {{provider.id}}\n";

fn markdown_handshake(provider_id: &str) -> ProviderHandshake {
    ProviderHandshake::new(provider_id, "1.0.0", "0.1.0").with_capabilities(["render:markdown"])
}

fn markdown_only(provider_id: &str) -> PassthroughProvider {
    PassthroughProvider::with_handshake(markdown_handshake(provider_id))
}

mod gating {
    use super::*;

    #[test]
    fn contract_missing_capability_skips_only_that_target() {
        let env = TestEnv::new();
        env.write("rules/hello.md", TEMPLATED);
        let (events, sink) = recorder();
        let (plain, plain_calls) = counting(markdown_handshake("plain"));
        let (cursor, cursor_calls) = counting_passthrough("cursor");
        let options = CompileOptions::new()
            .with_provider(plain)
            .with_provider(cursor)
            .with_event_sink(sink);

        let output = compile(&env.input("rules/hello.md", &["plain", "cursor"]), &options).unwrap();

        assert_eq!(plain_calls.get(), 0);
        assert_eq!(cursor_calls.get(), 1);
        let errors: Vec<_> = output.diagnostics.iter().filter(|d| d.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("render:handlebars"));

        assert_eq!(output.artifacts.len(), 1);
        assert!(output.artifacts[0].contents.ends_with("Hello cursor\n"));
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].provider_id, "plain");
        assert_eq!(output.skipped[0].reason, SkipReason::MissingCapability);

        let missing = events.lock().unwrap().iter().find_map(|event| match event {
            CompilationEvent::TargetCapabilities {
                provider_id,
                missing,
                ..
            } if provider_id == "plain" => Some(missing.clone()),
            _ => None,
        });
        assert_eq!(missing, Some(vec!["render:handlebars".to_string()]));
        assert_eq!(kinds(&events).last(), Some(&"pipeline:end"));
    }

    #[test]
    fn contract_markdown_document_needs_no_optional_capability() {
        let env = TestEnv::new();
        env.write("rules/style.md", PLAIN_RULE);
        let options = CompileOptions::new().with_provider(markdown_only("plain"));

        let output = compile(&env.input("rules/style.md", &["plain"]), &options).unwrap();

        assert!(output.skipped.is_empty());
        assert_eq!(output.artifacts[0].contents, PLAIN_RULE);
    }
}

mod hard_fail {
    use super::*;

    fn failing_build() -> ProjectConfig {
        ProjectConfig {
            build: BuildConfig {
                fail_on_missing_capabilities: true,
            },
            ..ProjectConfig::default()
        }
    }

    #[test]
    fn contract_build_flag_aborts_run() {
        let env = TestEnv::new();
        env.write("rules/hello.md", TEMPLATED);
        let (events, sink) = recorder();
        let options = CompileOptions::new()
            .with_provider(markdown_only("plain"))
            .with_event_sink(sink);

        let err = compile(
            &env.input("rules/hello.md", &["plain"]).with_project_config(failing_build()),
            &options,
        )
        .unwrap_err();

        assert_eq!(err.code(), "PROVIDER_CAPABILITY_UNSUPPORTED");
        let diagnostic = err.diagnostic().unwrap();
        assert!(diagnostic.is_error());
        assert!(!kinds(&events).contains(&"pipeline:end"));
    }

    #[test]
    fn contract_provider_flag_aborts_run() {
        let env = TestEnv::new();
        env.write("rules/hello.md", TEMPLATED);
        let config = ProjectConfig::default().with_provider(
            "plain",
            ProviderConfig {
                fail_on_missing_capabilities: Some(true),
                ..ProviderConfig::default()
            },
        );
        let options = CompileOptions::new().with_provider(markdown_only("plain"));

        let err = compile(
            &env.input("rules/hello.md", &["plain"]).with_project_config(config),
            &options,
        )
        .unwrap_err();

        assert!(err
            .to_string()
            .contains("providers.plain.failOnMissingCapabilities"));
    }

    #[test]
    fn contract_config_from_yaml_drives_policy() {
        let env = TestEnv::new();
        env.write("rules/hello.md", TEMPLATED);
        let config = ProjectConfig::from_yaml_str(
            "build:\n  failOnMissingCapabilities: true\nproviders:\n  plain:\n    failOnMissingCapabilities: false\n",
        )
        .unwrap();
        let options = CompileOptions::new().with_provider(markdown_only("plain"));

        let output = compile(
            &env.input("rules/hello.md", &["plain"]).with_project_config(config),
            &options,
        )
        .unwrap();

        assert_eq!(output.skipped[0].reason, SkipReason::MissingCapability);
    }
}
