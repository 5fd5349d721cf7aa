//! Application Layer
//!
//! Use cases that drive the domain services and infrastructure:
//!
//! - `compile` - One compilation run (`compile`, `compile_stream`)
//! - `watch` - Debounced recompilation on filesystem changes

pub mod compile;
pub mod watch;

pub use compile::{
    compile, compile_stream, CompilationInput, CompilationOutput, CompilationStream,
    CompileOptions, CompileUseCase, SkippedTarget, SourceSummary,
};
pub use watch::{
    watch, watch_compilation, DirectoryWatcher, NotifyWatcher, WatchDriver, WatchOptions,
    WatchRun, WatcherState, DEBOUNCE_MS,
};
