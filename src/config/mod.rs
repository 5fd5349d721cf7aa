//! Configuration consumed by the orchestrator
//!
//! Precedence for Handlebars directives and output formats (lowest first):
//! 1. Project `rule` section
//! 2. Document frontmatter `rule` section
//! 3. Project `providers.<id>` section
//! 4. Document frontmatter `<providerId>` section

mod types;

pub use types::{
    BuildConfig, HandlebarsDirective, ProjectConfig, ProviderConfig, RuleConfig, RuntimeContext,
};
