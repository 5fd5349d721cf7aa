//! Domain Layer
//!
//! Pure orchestration rules without I/O.
//!
//! ## Structure
//!
//! - `value_objects/` - Immutable value types (ContentHash, capabilities)
//! - `services/` - Directive lookup and capability negotiation
//! - `ports/` - Provider, pipeline stage and event sink interfaces

pub mod ports;
pub mod services;
pub mod value_objects;
