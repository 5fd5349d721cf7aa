//! Watch driver
//!
//! Runs the executor once, then again for every debounced batch of
//! filesystem changes. Each run's batch is its invalidation input, and the
//! set of watched directories is recomputed from the run's output.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::application::compile::{compile, CompilationInput, CompilationOutput, CompileOptions};
use crate::error::RulesetResult;
use crate::infrastructure::fs::{canonicalize_or_normalize, normalize_path};

use super::event::{WatchOptions, WatchRun, WatcherState};

/// How long the driver blocks on the event channel between checks
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Something that can watch individual directories
pub trait DirectoryWatcher {
    fn watch_dir(&mut self, dir: &Path) -> Result<(), notify::Error>;
    fn unwatch_dir(&mut self, dir: &Path) -> Result<(), notify::Error>;
}

/// [`DirectoryWatcher`] backed by the platform's notify watcher
pub struct NotifyWatcher {
    inner: RecommendedWatcher,
}

impl NotifyWatcher {
    /// Create a watcher feeding changed paths into a channel
    pub fn new() -> Result<(Self, Receiver<PathBuf>), notify::Error> {
        let (tx, rx) = channel();
        let inner = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                let Ok(event) = res else {
                    return;
                };
                if !(event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove()) {
                    return;
                }
                for path in event.paths {
                    let _ = tx.send(path);
                }
            },
            notify::Config::default(),
        )?;
        Ok((Self { inner }, rx))
    }
}

impl DirectoryWatcher for NotifyWatcher {
    fn watch_dir(&mut self, dir: &Path) -> Result<(), notify::Error> {
        self.inner.watch(dir, RecursiveMode::NonRecursive)
    }

    fn unwatch_dir(&mut self, dir: &Path) -> Result<(), notify::Error> {
        self.inner.unwatch(dir)
    }
}

/// Iterator over watch-triggered compilations
///
/// Yields the initial run first, then one item per debounced batch. A
/// fatal executor error is yielded once and ends the iteration; setting the
/// stop flag ends it after the current run.
pub struct WatchDriver<E, W = NotifyWatcher> {
    executor: E,
    watcher: W,
    events: Receiver<PathBuf>,
    state: WatcherState,
    options: WatchOptions,
    watched: BTreeSet<PathBuf>,
    iteration: usize,
    started: bool,
    finished: bool,
}

/// Watch with the platform watcher
pub fn watch<E>(executor: E, options: WatchOptions) -> RulesetResult<WatchDriver<E>>
where
    E: FnMut(&WatchRun) -> RulesetResult<CompilationOutput>,
{
    let (watcher, events) = NotifyWatcher::new()?;
    Ok(WatchDriver::with_watcher(executor, options, watcher, events))
}

/// Watch a compilation input, recompiling with the changed paths invalidated
///
/// Source directories are watched from the start; the cache directory is
/// ignored. The project config loaded into `input` is reused for every run,
/// so its file is not watched. Callers that reload configuration on change
/// should build the input inside their own executor and use [`watch`].
pub fn watch_compilation(
    input: CompilationInput,
    options: CompileOptions,
    mut watch_options: WatchOptions,
) -> RulesetResult<WatchDriver<impl FnMut(&WatchRun) -> RulesetResult<CompilationOutput>>> {
    let context = &input.context;
    watch_options.cwd = context.cwd.clone();
    for source in &input.sources {
        if let Some(path) = &source.path {
            watch_options.roots.push(context.resolve(path));
        }
    }
    if let Some(cache_dir) = &context.cache_dir {
        watch_options.ignored.push(context.resolve(cache_dir));
    }

    let executor = move |run: &WatchRun| -> RulesetResult<CompilationOutput> {
        let options = options
            .clone()
            .with_invalidate_paths(run.invalidate_paths.iter().cloned());
        compile(&input, &options)
    };
    watch(executor, watch_options)
}

impl<E, W> WatchDriver<E, W>
where
    E: FnMut(&WatchRun) -> RulesetResult<CompilationOutput>,
    W: DirectoryWatcher,
{
    /// Drive `executor` from an arbitrary watcher and event channel
    pub fn with_watcher(
        executor: E,
        options: WatchOptions,
        watcher: W,
        events: Receiver<PathBuf>,
    ) -> Self {
        let mut driver = Self {
            executor,
            watcher,
            events,
            state: WatcherState::new(options.debounce),
            options,
            watched: BTreeSet::new(),
            iteration: 0,
            started: false,
            finished: false,
        };
        let roots = driver.root_dirs();
        driver.sync_dirs(roots);
        driver
    }

    /// Directories currently watched
    pub fn watched_dirs(&self) -> impl Iterator<Item = &Path> {
        self.watched.iter().map(PathBuf::as_path)
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    fn run(&mut self, invalidate_paths: Vec<PathBuf>) -> RulesetResult<CompilationOutput> {
        let run = WatchRun {
            iteration: self.iteration,
            invalidate_paths,
        };
        self.iteration += 1;
        debug!(
            event = "watch.run",
            iteration = run.iteration,
            changed = run.invalidate_paths.len(),
        );

        match (self.executor)(&run) {
            Ok(output) => {
                let dirs = self.watch_set(&output);
                self.sync_dirs(dirs);
                Ok(output)
            }
            Err(err) => {
                self.finished = true;
                Err(err)
            }
        }
    }

    fn root_dirs(&self) -> BTreeSet<PathBuf> {
        self.options
            .roots
            .iter()
            .map(|root| self.options.resolve(root))
            .filter_map(|path| watch_dir_for(&path))
            .collect()
    }

    /// Roots plus the directories of every source and resolved dependency
    fn watch_set(&self, output: &CompilationOutput) -> BTreeSet<PathBuf> {
        let mut dirs = self.root_dirs();
        let files = output.sources.iter().flat_map(|summary| {
            summary
                .source_path
                .iter()
                .chain(summary.dependencies.iter())
        });
        for file in files {
            if let Some(dir) = watch_dir_for(&self.options.resolve(file)) {
                dirs.insert(dir);
            }
        }
        dirs
    }

    fn sync_dirs(&mut self, wanted: BTreeSet<PathBuf>) {
        let stale: Vec<PathBuf> = self.watched.difference(&wanted).cloned().collect();
        for dir in stale {
            if let Err(err) = self.watcher.unwatch_dir(&dir) {
                debug!(event = "watch.unregister_failed", dir = %dir.display(), error = %err);
            }
            self.watched.remove(&dir);
        }

        for dir in wanted {
            if self.watched.contains(&dir) {
                continue;
            }
            match self.watcher.watch_dir(&dir) {
                Ok(()) => {
                    self.watched.insert(dir);
                }
                Err(err) => {
                    warn!(event = "watch.register_failed", dir = %dir.display(), error = %err);
                }
            }
        }
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        let canonical = canonicalize_or_normalize(path);
        self.options.ignored.iter().any(|prefix| {
            let prefix = self.options.resolve(prefix);
            normalized.starts_with(normalize_path(&prefix))
                || canonical.starts_with(canonicalize_or_normalize(&prefix))
        })
    }
}

/// Directory to watch for a path: itself when it is a directory, else its parent
fn watch_dir_for(path: &Path) -> Option<PathBuf> {
    let dir = if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent()?.to_path_buf()
    };
    dir.is_dir().then(|| canonicalize_or_normalize(&dir))
}

impl<E, W> Iterator for WatchDriver<E, W>
where
    E: FnMut(&WatchRun) -> RulesetResult<CompilationOutput>,
    W: DirectoryWatcher,
{
    type Item = RulesetResult<CompilationOutput>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.run(Vec::new()));
        }

        loop {
            if self.options.is_stopped() {
                self.finished = true;
                return None;
            }

            match self.events.recv_timeout(POLL_INTERVAL) {
                Ok(path) => {
                    if !self.is_ignored(&path) {
                        self.state.add_change(path);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    if !self.state.has_pending() {
                        self.finished = true;
                        return None;
                    }
                    // Sender gone: flush what is pending without waiting.
                    let changes = self.state.take_changes();
                    return Some(self.run(changes));
                }
            }

            if self.state.should_sync() {
                let changes = self.state.take_changes();
                debug!(event = "watch.batch", changed = changes.len());
                return Some(self.run(changes));
            }
        }
    }
}
