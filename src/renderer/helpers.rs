//! Handlebars helpers
//!
//! Built-in helpers plus caller-registered helper modules. A helper module
//! stands in for a loadable script: it is registered once under a specifier
//! (`./helpers/text.js`, `text-helpers`) and referenced from directives by
//! that specifier.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use handlebars::{
    handlebars_helper, Context, Handlebars, Helper, HelperDef, HelperResult, Output,
    RenderContext, RenderError, RenderErrorReason, Renderable, ScopedJson,
};
use serde_json::Value;

use crate::infrastructure::fs::normalize_path;
use crate::models::{Dependency, DependencyKind, Diagnostic};

/// A helper implementation: positional params in, JSON value out
pub type HelperFn = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// A named bundle of helpers
///
/// Mirrors a script module: helpers on its default export plus named exports.
/// Named exports win on name clashes.
#[derive(Clone, Default)]
pub struct HelperModule {
    default_export: BTreeMap<String, HelperFn>,
    named: BTreeMap<String, HelperFn>,
}

impl HelperModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a helper to the module's default export
    pub fn with_default<F>(mut self, name: impl Into<String>, helper: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.default_export.insert(name.into(), Arc::new(helper));
        self
    }

    /// Add a named export
    pub fn with_named<F>(mut self, name: impl Into<String>, helper: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.named.insert(name.into(), Arc::new(helper));
        self
    }

    /// All helpers keyed by name
    pub fn helpers(&self) -> BTreeMap<String, HelperFn> {
        let mut helpers = self.default_export.clone();
        helpers.extend(self.named.iter().map(|(k, v)| (k.clone(), v.clone())));
        helpers
    }

    pub fn is_empty(&self) -> bool {
        self.default_export.is_empty() && self.named.is_empty()
    }
}

impl fmt::Debug for HelperModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperModule")
            .field("default_export", &self.default_export.keys().collect::<Vec<_>>())
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Helper modules available to directives, keyed by specifier
#[derive(Debug, Clone, Default)]
pub struct HelperRegistry {
    modules: BTreeMap<String, HelperModule>,
}

/// Helpers resolved for one render call
#[derive(Default)]
pub struct LoadedHelpers {
    pub helpers: BTreeMap<String, HelperFn>,
    pub diagnostics: Vec<Diagnostic>,
    pub dependencies: Vec<Dependency>,
}

fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || Path::new(specifier).is_absolute()
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, specifier: impl Into<String>, module: HelperModule) {
        self.modules.insert(specifier.into(), module);
    }

    pub fn with_module(mut self, specifier: impl Into<String>, module: HelperModule) -> Self {
        self.register(specifier, module);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Find a module by specifier
    ///
    /// Bare names match exactly. Path specifiers match any registered path
    /// specifier resolving to the same file under `cwd`.
    pub fn lookup(&self, specifier: &str, cwd: &Path) -> Option<&HelperModule> {
        if let Some(module) = self.modules.get(specifier) {
            return Some(module);
        }
        if !is_path_specifier(specifier) {
            return None;
        }
        let wanted = normalize_path(&cwd.join(specifier));
        self.modules
            .iter()
            .find(|(key, _)| is_path_specifier(key) && normalize_path(&cwd.join(key)) == wanted)
            .map(|(_, module)| module)
    }

    /// Resolve directive helper specifiers into helpers
    ///
    /// Unknown modules produce an error diagnostic and are skipped; modules
    /// without helpers produce a warning. Path specifiers are recorded as
    /// import dependencies.
    pub fn load(&self, specifiers: &[String], cwd: &Path, provider_id: &str) -> LoadedHelpers {
        let mut loaded = LoadedHelpers::default();
        for specifier in specifiers {
            if is_path_specifier(specifier) {
                let resolved: PathBuf = normalize_path(&cwd.join(specifier));
                loaded
                    .dependencies
                    .push(Dependency::new(DependencyKind::Import, specifier.clone()).resolved(resolved));
            }

            let Some(module) = self.lookup(specifier, cwd) else {
                loaded.diagnostics.push(
                    Diagnostic::error(format!(
                        "Failed to load Handlebars helper module \"{specifier}\": no module registered under that specifier"
                    ))
                    .with_tags(["renderer", "handlebars", provider_id, "helpers"])
                    .with_hint("Register the module on the renderer's helper registry"),
                );
                continue;
            };

            if module.is_empty() {
                loaded.diagnostics.push(
                    Diagnostic::warning(format!(
                        "Handlebars helper module \"{specifier}\" exports no helpers"
                    ))
                    .with_tags(["renderer", "handlebars", provider_id, "helpers"]),
                );
                continue;
            }
            loaded.helpers.extend(module.helpers());
        }
        loaded
    }
}

/// Adapts a [`HelperFn`] to Handlebars
pub(crate) struct ClosureHelper {
    name: String,
    func: HelperFn,
}

impl ClosureHelper {
    pub(crate) fn new(name: impl Into<String>, func: HelperFn) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl HelperDef for ClosureHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let params: Vec<Value> = h.params().iter().map(|p| p.value().clone()).collect();
        (self.func)(&params)
            .map(ScopedJson::Derived)
            .map_err(|message| {
                RenderErrorReason::Other(format!("helper '{}' failed: {message}", self.name)).into()
            })
    }
}

/// `{{#if-provider "cursor,windsurf"}}...{{else}}...{{/if-provider}}`
///
/// Renders the block when the context's `provider.id` is in the list.
pub(crate) struct IfProviderHelper;

impl HelperDef for IfProviderHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let list = h
            .param(0)
            .and_then(|p| p.value().as_str())
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("if-provider", 0))?;
        let current = ctx
            .data()
            .pointer("/provider/id")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let matched = list
            .split(',')
            .map(str::trim)
            .any(|id| !id.is_empty() && id == current);

        let branch = if matched { h.template() } else { h.inverse() };
        match branch {
            Some(template) => template.render(r, ctx, rc, out),
            None => Ok(()),
        }
    }
}

handlebars_helper!(uppercase: |s: str| s.to_uppercase());
handlebars_helper!(lowercase: |s: str| s.to_lowercase());
handlebars_helper!(json: |v: Json| serde_json::to_string_pretty(v).unwrap_or_default());

/// Register `uppercase`, `lowercase`, `json` and `if-provider`
pub(crate) fn register_builtins(registry: &mut Handlebars<'_>) {
    registry.register_helper("uppercase", Box::new(uppercase));
    registry.register_helper("lowercase", Box::new(lowercase));
    registry.register_helper("json", Box::new(json));
    registry.register_helper("if-provider", Box::new(IfProviderHelper));
}
