//! Watch options, runs and debounce state

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default quiet period before a batch of changes is flushed
pub const DEBOUNCE_MS: u64 = 100;

/// Watch options
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Quiet period after the last change before recompiling
    pub debounce: Duration,
    /// Base for relative source and dependency paths
    pub cwd: PathBuf,
    /// Extra paths to watch besides sources and dependencies
    pub roots: Vec<PathBuf>,
    /// Path prefixes whose changes are dropped
    pub ignored: Vec<PathBuf>,
    /// Set to stop the driver after the current run
    pub stop: Arc<AtomicBool>,
}

impl WatchOptions {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            debounce: Duration::from_millis(DEBOUNCE_MS),
            cwd: cwd.into(),
            roots: Vec::new(),
            ignored: Vec::new(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_debounce_ms(self, millis: u64) -> Self {
        self.with_debounce(Duration::from_millis(millis))
    }

    pub fn with_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.roots.push(path.into());
        self
    }

    pub fn with_ignored(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.ignored.push(prefix.into());
        self
    }

    /// Share an existing stop flag
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Handle for stopping the driver from another thread
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub(crate) fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

/// One recompilation requested by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRun {
    /// 0 for the initial full run
    pub iteration: usize,
    /// Changed paths since the previous run, sorted
    pub invalidate_paths: Vec<PathBuf>,
}

/// Watcher state for debouncing
#[derive(Debug)]
pub struct WatcherState {
    debounce: Duration,
    pending_changes: HashSet<PathBuf>,
    last_change: Option<Instant>,
}

impl Default for WatcherState {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEBOUNCE_MS))
    }
}

impl WatcherState {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending_changes: HashSet::new(),
            last_change: None,
        }
    }

    /// Add a change and re-arm the debounce timer
    pub fn add_change(&mut self, path: PathBuf) {
        self.pending_changes.insert(path);
        self.last_change = Some(Instant::now());
    }

    /// Check if the quiet period has passed with changes pending
    pub fn should_sync(&self) -> bool {
        match self.last_change {
            Some(last) => !self.pending_changes.is_empty() && last.elapsed() >= self.debounce,
            None => false,
        }
    }

    /// Take all pending changes, sorted, resetting state
    pub fn take_changes(&mut self) -> Vec<PathBuf> {
        let mut changes: Vec<_> = self.pending_changes.drain().collect();
        changes.sort();
        self.last_change = None;
        changes
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_changes.is_empty()
    }
}
