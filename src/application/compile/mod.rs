//! Compile Module
//!
//! Orchestrates compilation runs.
//!
//! ## Structure
//!
//! - `options` - Inputs and collaborators (`CompilationInput`, `CompileOptions`)
//! - `result` - Result types (`CompilationOutput`, `SourceSummary`)
//! - `use_case` - Core use case logic (`CompileUseCase`, `compile`)
//! - `stream` - Worker-thread variant yielding events (`compile_stream`)
//!
//! ## Usage
//!
//! ```ignore
//! use rulesets::application::compile::{compile, CompilationInput, CompileOptions};
//!
//! let input = CompilationInput::new(context).with_source(source).with_target(target);
//! let output = compile(&input, &CompileOptions::new().with_provider(provider))?;
//! ```

mod options;
mod result;
mod stream;
mod use_case;

pub use options::{CompilationInput, CompileOptions};
pub use result::{CompilationOutput, SkippedTarget, SourceSummary};
pub use stream::{compile_stream, CompilationStream, STREAM_BUFFER};
pub use use_case::{compile, CompileUseCase};
