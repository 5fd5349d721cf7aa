//! Watch
//!
//! Debounced recompilation driven by filesystem changes:
//! - `WatcherState` collects changed paths until the quiet period passes
//! - `WatchDriver` runs the executor and keeps the watched directory set in
//!   step with each run's sources and dependencies
//! - `watch_compilation` wires the driver to [`compile`](super::compile::compile)
//!
//! ## Usage
//!
//! ```ignore
//! let driver = watch_compilation(input, options, WatchOptions::new(cwd))?;
//! for run in driver {
//!     let output = run?;
//!     // ...
//! }
//! ```

mod driver;
mod event;


pub use driver::{watch, watch_compilation, DirectoryWatcher, NotifyWatcher, WatchDriver};
pub use event::{WatchOptions, WatchRun, WatcherState, DEBOUNCE_MS};
