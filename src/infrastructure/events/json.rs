//! JSON Event Sink
//!
//! Outputs compilation events as NDJSON for CI/automation consumption.

use crate::domain::ports::{CompilationEvent, CompilationEventSink};
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that writes one JSON object per line
pub struct NdjsonEventSink {
    /// Mutex to ensure thread-safe writes
    writer: Mutex<Box<dyn Write + Send>>,
    /// Include artifact contents in `artifact:emitted` lines
    include_contents: bool,
}

impl NdjsonEventSink {
    /// Create a new sink writing to stdout
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Create a sink writing to a custom writer
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            include_contents: false,
        }
    }

    /// Emit full artifact contents instead of a byte count
    pub fn include_contents(mut self, include: bool) -> Self {
        self.include_contents = include;
        self
    }

    fn write_line(&self, line: serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl CompilationEventSink for NdjsonEventSink {
    fn on_event(&self, event: &CompilationEvent) {
        let Ok(mut json) = serde_json::to_value(event) else {
            return;
        };

        if let CompilationEvent::ArtifactEmitted { artifact, .. } = event {
            if !self.include_contents {
                if let Some(artifact_json) = json.get_mut("artifact").and_then(|a| a.as_object_mut()) {
                    artifact_json.remove("contents");
                    artifact_json.insert("bytes".to_string(), artifact.contents.len().into());
                }
            }
        }

        self.write_line(json);
    }
}
