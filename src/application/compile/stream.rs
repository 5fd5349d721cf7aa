//! Streaming compilation
//!
//! Runs the use case on a worker thread and hands its events over a bounded
//! channel. The channel closes once the run is over, right after
//! `pipeline:end` (or after the last event of an aborted run).

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::domain::ports::{CompilationEvent, CompilationEventSink};
use crate::error::RulesetResult;

use super::options::{CompilationInput, CompileOptions};
use super::result::CompilationOutput;
use super::use_case::CompileUseCase;

/// Events buffered before the worker blocks
pub const STREAM_BUFFER: usize = 64;

/// Sink that forwards to the channel and to the caller's own sink
struct ChannelSink {
    sender: SyncSender<CompilationEvent>,
    forward: Arc<dyn CompilationEventSink>,
}

impl CompilationEventSink for ChannelSink {
    fn on_event(&self, event: &CompilationEvent) {
        self.forward.on_event(event);
        // The receiver may be gone; the run still completes.
        let _ = self.sender.send(event.clone());
    }
}

/// Iterator over the events of a run in progress
///
/// Call [`CompilationStream::finish`] for the run's result.
pub struct CompilationStream {
    events: Receiver<CompilationEvent>,
    worker: JoinHandle<RulesetResult<CompilationOutput>>,
}

impl Iterator for CompilationStream {
    type Item = CompilationEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.events.recv().ok()
    }
}

impl CompilationStream {
    /// Drain remaining events and wait for the run's result
    pub fn finish(self) -> RulesetResult<CompilationOutput> {
        let CompilationStream { events, worker } = self;
        for _ in events.iter() {}
        match worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Compile on a worker thread, yielding events as they happen
pub fn compile_stream(input: CompilationInput, options: CompileOptions) -> CompilationStream {
    let (sender, events) = sync_channel(STREAM_BUFFER);
    let sink = ChannelSink {
        sender,
        forward: Arc::clone(&options.event_sink),
    };
    let options = options.with_event_sink(Arc::new(sink));

    let worker = std::thread::spawn(move || CompileUseCase::new(options).execute(&input));
    CompilationStream { events, worker }
}
