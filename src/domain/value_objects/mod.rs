//! Value Objects
//!
//! Immutable, identity-less types shared across the domain.

pub mod capability;
mod hash;

pub use capability::{ids, normalize_capabilities, CapabilityDescriptor, CapabilityRegistry};
pub use hash::ContentHash;
