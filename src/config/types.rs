//! Configuration type definitions

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Handlebars settings as written in project config or frontmatter
///
/// Accepts both a plain flag:
///   handlebars: true
///
/// And a settings table:
///   handlebars:
///     force: true
///     helpers: ["./helpers/text.js"]
///     partials: { header: "shared/header" }
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlebarsDirective {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_escape: Option<bool>,
    /// Helper module specifiers
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub helpers: Vec<String>,
    /// Partial name -> identifier or path
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub partials: BTreeMap<String, String>,
}

impl HandlebarsDirective {
    pub fn enabled() -> Self {
        Self {
            enabled: Some(true),
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: Some(false),
            ..Self::default()
        }
    }

    pub fn with_helper(mut self, specifier: impl Into<String>) -> Self {
        self.helpers.push(specifier.into());
        self
    }

    pub fn with_partial(mut self, name: impl Into<String>, identifier: impl Into<String>) -> Self {
        self.partials.insert(name.into(), identifier.into());
        self
    }

    /// Parse a directive out of an arbitrary frontmatter value
    ///
    /// Returns `None` when the value has the wrong shape.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum HandlebarsDirectiveDe {
    Flag(bool),
    Table {
        #[serde(default)]
        enabled: Option<bool>,
        #[serde(default)]
        force: Option<bool>,
        #[serde(default)]
        strict: Option<bool>,
        #[serde(default, rename = "noEscape")]
        no_escape: Option<bool>,
        #[serde(default)]
        helpers: Vec<String>,
        #[serde(default)]
        partials: BTreeMap<String, String>,
    },
}

impl<'de> Deserialize<'de> for HandlebarsDirective {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match HandlebarsDirectiveDe::deserialize(deserializer)? {
            HandlebarsDirectiveDe::Flag(enabled) => Ok(Self {
                enabled: Some(enabled),
                ..Self::default()
            }),
            HandlebarsDirectiveDe::Table {
                enabled,
                force,
                strict,
                no_escape,
                helpers,
                partials,
            } => Ok(Self {
                enabled,
                force,
                strict,
                no_escape,
                helpers,
                partials,
            }),
        }
    }
}

/// Project-wide rule settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handlebars: Option<HandlebarsDirective>,
    /// Extra directories probed for partials, after the built-in ones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial_dirs: Vec<PathBuf>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-provider settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Output format id (`markdown`, `xml`, or a registered custom format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handlebars: Option<HandlebarsDirective>,
    /// Overrides `build.failOnMissingCapabilities` for this provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on_missing_capabilities: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Build-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    #[serde(default)]
    pub fail_on_missing_capabilities: bool,
}

/// Project configuration consumed by the orchestrator
///
/// Loading and format detection belong to the config loader; this type only
/// fixes the shape. Unknown keys are kept in `extra` and passed through to
/// templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub rule: RuleConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub providers: BTreeMap<String, ProviderConfig>,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectConfig {
    pub fn provider(&self, provider_id: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider_id)
    }

    pub fn with_provider(mut self, provider_id: impl Into<String>, config: ProviderConfig) -> Self {
        self.providers.insert(provider_id.into(), config);
        self
    }

    /// Parse a config from YAML text (also accepts JSON)
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml_ng::Error> {
        serde_yaml_ng::from_str(text)
    }
}

/// Runtime information for one orchestrator run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeContext {
    /// Version of the host tool
    pub version: String,
    /// Working directory relative paths resolve against
    pub cwd: PathBuf,
    /// Where `orchestrator-cache.json` lives; caching is off when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Flattened environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl RuntimeContext {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            cwd: cwd.into(),
            cache_dir: None,
            env: BTreeMap::new(),
        }
    }

    /// Context for the current process: its working directory and environment
    pub fn from_process() -> std::io::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::new(cwd).with_env(std::env::vars()))
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Resolve a possibly relative path against `cwd`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}
