//! Cache contracts
//!
//! Unchanged inputs replay identical output; a changed dependency forces a
//! recompile only when the caller names it.

use crate::common::*;
use rulesets::{compile, CompileOptions, PassthroughProvider};

mod idempotence {
    use super::*;

    #[test]
    fn contract_unchanged_inputs_produce_identical_output() {
        let env = TestEnv::new();
        env.write("rules/style.md", PLAIN_RULE);
        let input = env.input("rules/style.md", &["cursor", "windsurf"]);
        let (cursor, cursor_calls) = counting_passthrough("cursor");
        let (windsurf, windsurf_calls) = counting_passthrough("windsurf");
        let options = CompileOptions::new()
            .with_provider(cursor)
            .with_provider(windsurf);

        let first = compile(&input, &options).unwrap();
        assert_eq!((cursor_calls.get(), windsurf_calls.get()), (1, 1));

        let (events, sink) = recorder();
        let second = compile(&input, &options.clone().with_event_sink(sink)).unwrap();

        assert_eq!((cursor_calls.get(), windsurf_calls.get()), (1, 1));
        assert_eq!(first, second);
        assert_eq!(second.artifacts.len(), 2);
        let kinds = kinds(&events);
        assert_eq!(kinds.iter().filter(|k| **k == "target:cached").count(), 2);
        assert!(!kinds.contains(&"target:compiled"));
    }

    #[test]
    fn contract_cache_file_lives_in_cache_dir() {
        let env = TestEnv::new();
        env.write("rules/style.md", PLAIN_RULE);
        let options = CompileOptions::new().with_provider(PassthroughProvider::new("cursor"));

        compile(&env.input("rules/style.md", &["cursor"]), &options).unwrap();

        assert!(env.path(".ruleset/cache/orchestrator-cache.json").is_file());
    }

    #[test]
    fn contract_edited_source_recompiles() {
        let env = TestEnv::new();
        env.write("rules/style.md", PLAIN_RULE);
        let options = CompileOptions::new().with_provider(PassthroughProvider::new("cursor"));
        compile(&env.input("rules/style.md", &["cursor"]), &options).unwrap();

        env.write("rules/style.md", "# Rewritten\n");
        let output = compile(&env.input("rules/style.md", &["cursor"]), &options).unwrap();

        assert_eq!(output.artifacts[0].contents, "# Rewritten\n");
    }
}

mod dependency_invalidation {
    use super::*;

    #[test]
    fn contract_invalidated_partial_forces_recompile() {
        let env = TestEnv::new();
        env.write("rules/uses-partial.md", PARTIAL_RULE);
        let partial = env.write(".ruleset/partials/header.md", "# Header v1");
        let input = env.input("rules/uses-partial.md", &["cursor"]);
        let (provider, calls) = counting_passthrough("cursor");
        let options = CompileOptions::new().with_provider(provider);

        let first = compile(&input, &options).unwrap();
        assert!(first.artifacts[0].contents.contains("# Header v1"));
        assert!(first.sources[0]
            .dependencies
            .iter()
            .any(|dep| dep.ends_with("header.md")));

        env.write(".ruleset/partials/header.md", "# Header v2");

        // Without invalidation the cached artifact is replayed.
        let stale = compile(&input, &options).unwrap();
        assert!(stale.artifacts[0].contents.contains("# Header v1"));
        assert_eq!(calls.get(), 1);

        let fresh = compile(&input, &options.clone().with_invalidate_paths([partial])).unwrap();
        assert!(fresh.artifacts[0].contents.contains("# Header v2"));
        assert!(fresh.artifacts[0].contents.contains("Body for cursor."));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn contract_created_partial_forces_recompile() {
        let env = TestEnv::new();
        env.write("rules/uses-partial.md", PARTIAL_RULE);
        let input = env.input("rules/uses-partial.md", &["cursor"]);
        let (provider, calls) = counting_passthrough("cursor");
        let options = CompileOptions::new().with_provider(provider);

        let first = compile(&input, &options).unwrap();
        assert!(first.artifacts[0].contents.ends_with("---\nBody for cursor.\n"));
        let expected = env.path(".ruleset/partials/header.md");
        assert!(first.sources[0]
            .dependencies
            .iter()
            .any(|dep| dep.ends_with(".ruleset/partials/header.md")));

        let partial = env.write(".ruleset/partials/header.md", "# Header now exists");
        assert_eq!(partial, expected);
        let (events, sink) = recorder();
        let second = compile(
            &input,
            &options
                .clone()
                .with_invalidate_paths([partial])
                .with_event_sink(sink),
        )
        .unwrap();

        assert!(second.artifacts[0].contents.contains("# Header now exists"));
        assert!(!kinds(&events).contains(&"target:cached"));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn contract_shadowing_partial_forces_recompile() {
        let env = TestEnv::new();
        env.write("rules/uses-partial.md", PARTIAL_RULE);
        env.write(".ruleset/templates/header.md", "# From templates");
        let input = env.input("rules/uses-partial.md", &["cursor"]);
        let options = CompileOptions::new().with_provider(PassthroughProvider::new("cursor"));

        let first = compile(&input, &options).unwrap();
        assert!(first.artifacts[0].contents.contains("# From templates"));

        // A higher-priority directory now provides the partial.
        let shadow = env.write(".ruleset/partials/header.md", "# From partials");
        let second = compile(&input, &options.clone().with_invalidate_paths([shadow])).unwrap();

        assert!(second.artifacts[0].contents.contains("# From partials"));
    }

    #[test]
    fn contract_unrelated_invalidation_keeps_cache() {
        let env = TestEnv::new();
        env.write("rules/uses-partial.md", PARTIAL_RULE);
        env.write(".ruleset/partials/header.md", "# Header");
        let input = env.input("rules/uses-partial.md", &["cursor"]);
        let (provider, calls) = counting_passthrough("cursor");
        let options = CompileOptions::new().with_provider(provider);
        compile(&input, &options).unwrap();

        let (events, sink) = recorder();
        compile(
            &input,
            &options
                .clone()
                .with_invalidate_paths([env.path("elsewhere.md")])
                .with_event_sink(sink),
        )
        .unwrap();

        assert!(kinds(&events).contains(&"target:cached"));
        assert_eq!(calls.get(), 1);
    }
}
