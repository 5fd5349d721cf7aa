//! Common test utilities for orchestrator contract tests.
//!
//! This module provides:
//! - `TestEnv`: Isolated project directory with a cache directory
//! - Fixtures: Reusable source documents
//! - Providers: compile steps that count their calls

#![allow(dead_code)]

pub mod env;
pub mod fixtures;
pub mod providers;

pub use env::*;
pub use fixtures::*;
pub use providers::*;
