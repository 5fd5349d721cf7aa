//! Handlebars settings aggregated across directive sources

use std::collections::BTreeMap;

use crate::config::HandlebarsDirective;
use crate::domain::services::DirectiveOrigin;
use crate::domain::value_objects::ids;

/// Effective Handlebars settings for one (document, provider) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlebarsSettings {
    /// `Some(true)` if any source enables, else `Some(false)` if any disables
    pub enabled: Option<bool>,
    pub force: bool,
    pub strict: bool,
    pub no_escape: bool,
    /// Helper module specifiers, unioned in first-seen order
    pub helpers: Vec<String>,
    /// Partial name -> identifier, unioned; later sources win on name clashes
    pub partials: BTreeMap<String, String>,
}

impl Default for HandlebarsSettings {
    fn default() -> Self {
        Self {
            enabled: None,
            force: false,
            strict: true,
            no_escape: false,
            helpers: Vec::new(),
            partials: BTreeMap::new(),
        }
    }
}

impl HandlebarsSettings {
    /// Fold directives given lowest precedence first
    pub fn aggregate(directives: &[(DirectiveOrigin, HandlebarsDirective)]) -> Self {
        let mut settings = Self::default();
        for (_, directive) in directives {
            settings.enabled = match (settings.enabled, directive.enabled) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), _) | (_, Some(false)) => Some(false),
                (None, None) => None,
            };
            settings.force |= directive.force == Some(true);
            if let Some(strict) = directive.strict {
                settings.strict = strict;
            }
            if let Some(no_escape) = directive.no_escape {
                settings.no_escape = no_escape;
            }
            for helper in &directive.helpers {
                if !settings.helpers.contains(helper) {
                    settings.helpers.push(helper.clone());
                }
            }
            settings.partials.extend(
                directive
                    .partials
                    .iter()
                    .map(|(name, id)| (name.clone(), id.clone())),
            );
        }
        settings
    }

    /// Whether the body goes through Handlebars for a target
    ///
    /// `force` wins, then an explicit disable, then the target's capabilities.
    pub fn should_template(&self, capabilities: &[String]) -> bool {
        if self.force {
            return true;
        }
        if self.enabled == Some(false) {
            return false;
        }
        capabilities
            .iter()
            .any(|c| c.starts_with(ids::HANDLEBARS_PREFIX))
    }
}
