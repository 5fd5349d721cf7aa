//! Compilation cache
//!
//! Persists compiled artifacts per source in
//! `<cacheDir>/orchestrator-cache.json`:
//!
//! ```json
//! {"version": 1, "sources": {"<key>": {"hash": "...", "diagnostics": [],
//!   "targets": {"<providerId>": {"artifacts": []}}, "dependencies": []}}}
//! ```
//!
//! Persistence is best effort. A missing, unreadable or outdated file loads
//! as an empty cache; a failed flush disables writes for the rest of the run.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::value_objects::ContentHash;
use crate::infrastructure::fs::{atomic_write, canonicalize_or_normalize, normalize_path};
use crate::models::{CompileArtifact, Diagnostic};

/// Cache file name inside the cache directory
pub const CACHE_FILE_NAME: &str = "orchestrator-cache.json";

/// On-disk format version; any other version is discarded on load
pub const CACHE_VERSION: u32 = 1;

/// Artifacts one provider produced for one source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedTarget {
    /// Orchestrator output path the artifacts were compiled for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub artifacts: Vec<CompileArtifact>,
    /// Render and provider diagnostics, replayed on a cache hit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl CachedTarget {
    pub fn new(output_path: impl Into<PathBuf>, artifacts: Vec<CompileArtifact>) -> Self {
        Self {
            output_path: Some(output_path.into()),
            artifacts,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Whether these artifacts were compiled for `output_path`
    pub fn matches_output(&self, output_path: &Path) -> bool {
        match &self.output_path {
            Some(recorded) => recorded == output_path,
            None => self
                .artifacts
                .first()
                .is_some_and(|a| a.target.output_path == output_path),
        }
    }
}

/// Everything cached for one source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub hash: String,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default)]
    pub targets: BTreeMap<String, CachedTarget>,
    /// Resolved dependency paths, sorted and deduplicated
    #[serde(default)]
    pub dependencies: Vec<PathBuf>,
}

impl CacheEntry {
    pub fn new(hash: &ContentHash) -> Self {
        Self {
            hash: hash.to_string(),
            ..Self::default()
        }
    }

    /// Reusable when the hash matches and no dependency was invalidated
    pub fn is_valid(&self, hash: &ContentHash, invalidated: &InvalidationSet) -> bool {
        hash.matches_str(&self.hash)
            && !self.dependencies.iter().any(|dep| invalidated.contains(dep))
    }

    /// Cached artifacts for a provider compiled to `output_path`
    pub fn target(&self, provider_id: &str, output_path: &Path) -> Option<&CachedTarget> {
        self.targets
            .get(provider_id)
            .filter(|cached| cached.matches_output(output_path))
    }

    /// Replace the dependency list, sorting and deduplicating it
    pub fn set_dependencies<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut paths: Vec<PathBuf> = paths.into_iter().collect();
        paths.sort();
        paths.dedup();
        self.dependencies = paths;
    }
}

/// Paths whose dependents must be recompiled
///
/// Stores both the lexically normalized and the canonical form of each path
/// so symlinked temp directories still match.
#[derive(Debug, Clone, Default)]
pub struct InvalidationSet {
    paths: HashSet<PathBuf>,
}

impl InvalidationSet {
    /// Build from raw paths, resolving relative ones against `cwd`
    pub fn new<I, P>(paths: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut set = HashSet::new();
        for path in paths {
            let path = path.as_ref();
            let absolute = if path.is_absolute() {
                path.to_path_buf()
            } else {
                cwd.join(path)
            };
            set.insert(normalize_path(&absolute));
            set.insert(canonicalize_or_normalize(&absolute));
        }
        Self { paths: set }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    #[serde(default)]
    sources: BTreeMap<String, CacheEntry>,
}

/// In-memory cache for one run
#[derive(Debug, Clone)]
pub struct CacheState {
    path: Option<PathBuf>,
    sources: BTreeMap<String, CacheEntry>,
    writable: bool,
    dirty: bool,
}

impl CacheState {
    /// A cache that never persists
    pub fn disabled() -> Self {
        Self {
            path: None,
            sources: BTreeMap::new(),
            writable: false,
            dirty: false,
        }
    }

    /// Read the cache file under `cache_dir`
    ///
    /// `None` gives a disabled cache. Missing, corrupt or version-mismatched
    /// files give an empty, writable cache.
    pub fn load(cache_dir: Option<&Path>) -> Self {
        let Some(dir) = cache_dir else {
            return Self::disabled();
        };
        let path = dir.join(CACHE_FILE_NAME);
        let sources = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<CacheFile>(&text) {
                Ok(file) if file.version == CACHE_VERSION => file.sources,
                Ok(file) => {
                    debug!(event = "cache.version_reset", found = file.version, expected = CACHE_VERSION);
                    BTreeMap::new()
                }
                Err(err) => {
                    debug!(event = "cache.corrupt", path = %path.display(), error = %err);
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };

        Self {
            path: Some(path),
            sources,
            writable: true,
            dirty: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.sources.get(key)
    }

    pub fn put(&mut self, key: impl Into<String>, entry: CacheEntry) {
        self.sources.insert(key.into(), entry);
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Cache file location, when caching is enabled
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Write pending changes to disk
    ///
    /// Returns whether the file was written. Errors are logged and turn the
    /// cache read-only.
    pub fn flush(&mut self) -> bool {
        if !self.writable || !self.dirty {
            return false;
        }
        let Some(path) = self.path.clone() else {
            return false;
        };

        match self.write_locked(&path) {
            Ok(()) => {
                self.dirty = false;
                debug!(event = "cache.flushed", path = %path.display(), sources = self.sources.len());
                true
            }
            Err(err) => {
                self.writable = false;
                warn!(event = "cache.flush_failed", path = %path.display(), error = %err);
                false
            }
        }
    }

    fn write_locked(&self, path: &Path) -> std::io::Result<()> {
        let file = CacheFile {
            version: CACHE_VERSION,
            sources: self.sources.clone(),
        };
        let content = serde_json::to_vec_pretty(&file).map_err(std::io::Error::other)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock_file = fs::File::create(path.with_extension("lock"))?;
        lock_file.lock_exclusive()?;
        let result = atomic_write(path, &content);
        if let Err(err) = lock_file.unlock() {
            debug!(event = "cache.unlock_failed", path = %path.display(), error = %err);
        }
        result
    }
}
