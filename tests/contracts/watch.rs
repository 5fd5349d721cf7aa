//! Watch contracts
//!
//! A burst of changes inside the debounce window triggers one recompilation
//! whose invalidation set holds every changed path.

use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;

use crate::common::*;
use rulesets::application::watch::DirectoryWatcher;
use rulesets::{
    compile, watch_compilation, CompilationOutput, CompileOptions, PassthroughProvider,
    ProjectConfig, RulesetResult, WatchDriver, WatchOptions, WatchRun,
};

/// Watcher that accepts every directory and reports nothing itself
struct QuietWatcher;

impl DirectoryWatcher for QuietWatcher {
    fn watch_dir(&mut self, _dir: &Path) -> Result<(), notify::Error> {
        Ok(())
    }

    fn unwatch_dir(&mut self, _dir: &Path) -> Result<(), notify::Error> {
        Ok(())
    }
}

mod debounce {
    use super::*;

    #[test]
    fn contract_three_events_merge_into_one_run() {
        let env = TestEnv::new();
        env.write("rules/style.md", PLAIN_RULE);
        let input = env.input("rules/style.md", &["cursor"]);
        let options = CompileOptions::new().with_provider(PassthroughProvider::new("cursor"));

        let mut runs: Vec<WatchRun> = Vec::new();
        let (tx, rx) = channel();
        {
            let executor = |run: &WatchRun| -> RulesetResult<CompilationOutput> {
                runs.push(run.clone());
                let options = options
                    .clone()
                    .with_invalidate_paths(run.invalidate_paths.iter().cloned());
                compile(&input, &options)
            };
            let mut driver = WatchDriver::with_watcher(
                executor,
                WatchOptions::new(env.root.path()).with_debounce_ms(30),
                QuietWatcher,
                rx,
            );

            let initial = driver.next().unwrap().unwrap();
            assert_eq!(initial.artifacts.len(), 1);

            let changed: Vec<PathBuf> = ["rules/style.md", "rules/other.md", "partials/x.md"]
                .iter()
                .map(|p| env.path(p))
                .collect();
            for path in &changed {
                tx.send(path.clone()).unwrap();
            }

            let rerun = driver.next().unwrap().unwrap();
            assert_eq!(rerun.artifacts.len(), 1);
        }

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].iteration, 0);
        assert!(runs[0].invalidate_paths.is_empty());
        assert_eq!(runs[1].iteration, 1);
        assert_eq!(runs[1].invalidate_paths.len(), 3);
    }

    #[test]
    fn contract_cache_writes_do_not_retrigger() {
        let env = TestEnv::new();
        let (tx, rx) = channel();
        let mut count = 0;
        {
            let executor = |_run: &WatchRun| -> RulesetResult<CompilationOutput> {
                count += 1;
                Ok(CompilationOutput::default())
            };
            let mut driver = WatchDriver::with_watcher(
                executor,
                WatchOptions::new(env.root.path())
                    .with_debounce_ms(10)
                    .with_ignored(".ruleset/cache"),
                QuietWatcher,
                rx,
            );
            driver.next().unwrap().unwrap();

            tx.send(env.path(".ruleset/cache/orchestrator-cache.json")).unwrap();
            drop(tx);
            assert!(driver.next().is_none());
        }
        assert_eq!(count, 1);
    }
}

mod roots {
    use super::*;

    #[test]
    fn contract_loaded_config_file_is_not_watched() {
        let env = TestEnv::new();
        env.write("rules/style.md", PLAIN_RULE);
        env.write("conf/ruleset.yaml", "build:\n  failOnMissingCapabilities: false\n");
        let input = env
            .input("rules/style.md", &["cursor"])
            .with_project_config(ProjectConfig::default())
            .with_project_config_path("conf/ruleset.yaml");
        let options = CompileOptions::new().with_provider(PassthroughProvider::new("cursor"));

        let driver = watch_compilation(input, options, WatchOptions::new(env.root.path())).unwrap();
        let watched: Vec<&Path> = driver.watched_dirs().collect();

        assert!(watched.iter().any(|dir| dir.ends_with("rules")));
        assert!(!watched.iter().any(|dir| dir.ends_with("conf")));
    }
}
