//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `cache` - On-disk compilation cache
//! - `events` - Event sink implementations (NDJSON)
//! - `executor` - Provider execution, in-process or sandboxed subprocess
//! - `fs` - Path normalization and atomic writes
//! - `providers` - Ready-made providers

pub mod cache;
pub mod events;
pub mod executor;
pub mod fs;
pub mod providers;

pub use cache::{CacheEntry, CacheState, CachedTarget, InvalidationSet, CACHE_FILE_NAME};
pub use events::NdjsonEventSink;
pub use executor::{execute, merge_target, ProviderFailure};
pub use providers::{FnProvider, PassthroughProvider, SandboxedProvider};
