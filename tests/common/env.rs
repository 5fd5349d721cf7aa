//! Isolated project directory for compilation runs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rulesets::{
    CompilationEvent, CompilationEventSink, CompilationInput, CompileTarget, RuntimeContext,
    Source,
};
use tempfile::TempDir;

/// Temp project root whose cache lives in `.ruleset/cache`
pub struct TestEnv {
    pub root: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("create temp project"),
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    /// Write a file relative to the project root, creating parents
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn context(&self) -> RuntimeContext {
        RuntimeContext::new(self.root.path()).with_cache_dir(".ruleset/cache")
    }

    /// Input with one source read from `relative` and one target per provider
    pub fn input(&self, relative: &str, providers: &[&str]) -> CompilationInput {
        let contents = fs::read_to_string(self.path(relative)).expect("read source");
        let mut input = CompilationInput::new(self.context())
            .with_source(Source::new(source_id(Path::new(relative)), contents).with_path(relative));
        for provider in providers {
            input = input.with_target(CompileTarget::new(*provider, format!("out/{provider}.md")));
        }
        input
    }
}

fn source_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Sink that keeps every event in order
pub fn recorder() -> (Arc<Mutex<Vec<CompilationEvent>>>, Arc<dyn CompilationEventSink>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&events);
    let sink: Arc<dyn CompilationEventSink> = Arc::new(move |event: &CompilationEvent| {
        captured.lock().unwrap().push(event.clone());
    });
    (events, sink)
}

/// Event kinds recorded so far
pub fn kinds(events: &Mutex<Vec<CompilationEvent>>) -> Vec<&'static str> {
    events.lock().unwrap().iter().map(CompilationEvent::kind).collect()
}
