//! Domain Services
//!
//! Stateless logic shared by the renderer and the orchestrator.

pub mod directives;
pub mod negotiation;

pub use directives::{
    collect_handlebars_directives, resolve_output_format, DirectiveOrigin, DEFAULT_OUTPUT_FORMAT,
};
pub use negotiation::{
    derive_required_capabilities, find_missing, is_sdk_compatible,
    missing_capabilities_diagnostic, negotiate, should_fail_missing_capabilities, Negotiation,
    PROVIDER_SDK_VERSION,
};
