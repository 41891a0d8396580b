//! Continuous watch mode: react to filesystem changes instead of running
//! once.
//!
//! The watcher subscribes to non-recursive change notifications on the root
//! directory, debounces bursts (editors and downloads touch a file several
//! times before it settles), and then triggers an incremental engine run
//! scoped to the changed files. Each triggered run emits the same
//! line-oriented report protocol as a one-shot run.
//!
//! Stopping is cooperative: the stop flag is checked between batches, so an
//! in-flight move is never interrupted.

use crate::config::CompiledConfig;
use crate::engine::{OrganizationEngine, OrganizeOptions, TAGS_SIDECAR};
use crate::output::OutputFormatter;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long a changed file must stay quiet before it is organized.
const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// Idle poll interval; bounds how quickly a stop request is honored.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Errors that can occur while setting up or running the watcher.
#[derive(Debug)]
pub enum WatchError {
    /// The root path is missing or not a directory.
    InvalidRoot { path: PathBuf, source: io::Error },
    /// The underlying notification backend failed.
    Backend(notify::Error),
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchError::InvalidRoot { path, source } => {
                write!(f, "Invalid watch root {}: {}", path.display(), source)
            }
            WatchError::Backend(e) => write!(f, "Filesystem watcher error: {}", e),
        }
    }
}

impl std::error::Error for WatchError {}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::Backend(e)
    }
}

/// Handle to a running watcher. Dropping the handle without calling
/// [`WatcherHandle::stop`] leaves the watcher running for the life of the
/// process.
pub struct WatcherHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    /// Request a stop and wait for the loop to finish its current batch.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Long-running loop that re-invokes the engine on detected changes.
pub struct DirectoryWatcher;

impl DirectoryWatcher {
    /// Start watching `root` on a background thread and return a handle for
    /// stopping it.
    pub fn start(
        root: &Path,
        options: OrganizeOptions,
        config: CompiledConfig,
    ) -> Result<WatcherHandle, WatchError> {
        let (root, watcher, rx) = Self::setup(root)?;

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let thread = thread::spawn(move || {
            // The watcher must live as long as the loop; moving it into the
            // thread ties the two lifetimes together.
            let _watcher = watcher;
            watch_loop(&root, options, &config, &rx, &stop_flag);
        });

        Ok(WatcherHandle {
            stop,
            thread: Some(thread),
        })
    }

    /// Run the watch loop on the current thread until the process is
    /// terminated. This is the CLI entry point: the caller that spawned the
    /// process owns its lifetime.
    pub fn run_blocking(
        root: &Path,
        options: OrganizeOptions,
        config: CompiledConfig,
    ) -> Result<(), WatchError> {
        let (root, _watcher, rx) = Self::setup(root)?;
        let never_stop = AtomicBool::new(false);
        watch_loop(&root, options, &config, &rx, &never_stop);
        Ok(())
    }

    fn setup(
        root: &Path,
    ) -> Result<
        (
            PathBuf,
            RecommendedWatcher,
            Receiver<notify::Result<Event>>,
        ),
        WatchError,
    > {
        // Canonicalize so event paths (which the backend reports resolved)
        // compare equal against the watched root.
        let root = fs::canonicalize(root).map_err(|e| WatchError::InvalidRoot {
            path: root.to_path_buf(),
            source: e,
        })?;
        if !root.is_dir() {
            return Err(WatchError::InvalidRoot {
                path: root.clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(tx, notify::Config::default())?;
        watcher.watch(&root, RecursiveMode::NonRecursive)?;

        OutputFormatter::info(&format!("Watching {}", root.display()));
        Ok((root, watcher, rx))
    }
}

fn watch_loop(
    root: &Path,
    options: OrganizeOptions,
    config: &CompiledConfig,
    rx: &Receiver<notify::Result<Event>>,
    stop: &AtomicBool,
) {
    let mut pending: BTreeSet<PathBuf> = BTreeSet::new();
    let mut deadline = Instant::now();

    while !stop.load(Ordering::Relaxed) {
        let timeout = if pending.is_empty() {
            STOP_POLL_INTERVAL
        } else {
            deadline
                .saturating_duration_since(Instant::now())
                .min(STOP_POLL_INTERVAL)
        };

        match rx.recv_timeout(timeout) {
            Ok(Ok(event)) => {
                if is_interesting(&event) {
                    for path in event.paths {
                        if path.parent() == Some(root)
                            && path.file_name().is_some_and(|n| n != TAGS_SIDECAR)
                        {
                            pending.insert(path);
                        }
                    }
                    deadline = Instant::now() + DEBOUNCE_DELAY;
                }
            }
            Ok(Err(e)) => {
                OutputFormatter::warning(&format!("Watcher error: {}", e));
            }
            Err(RecvTimeoutError::Timeout) => {
                if !pending.is_empty() && Instant::now() >= deadline {
                    let batch: Vec<PathBuf> = std::mem::take(&mut pending).into_iter().collect();
                    run_batch(root, options, config, batch);
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                OutputFormatter::warning("Watcher channel closed; stopping");
                break;
            }
        }
    }

    // Drain anything already detected so a stop never loses a settled batch.
    if !pending.is_empty() {
        let batch: Vec<PathBuf> = pending.into_iter().collect();
        run_batch(root, options, config, batch);
    }
}

/// Run one incremental engine pass over the files that settled.
fn run_batch(root: &Path, options: OrganizeOptions, config: &CompiledConfig, batch: Vec<PathBuf>) {
    // Rename-out and delete events leave paths with nothing behind them.
    let batch: Vec<PathBuf> = batch.into_iter().filter(|p| p.is_file()).collect();
    if batch.is_empty() {
        return;
    }

    for path in &batch {
        if let Some(name) = path.file_name() {
            OutputFormatter::plain(&format!("Change detected: {}", name.to_string_lossy()));
        }
    }

    let engine = OrganizationEngine::new(options, config);
    match engine.organize_scoped(root, Some(&batch)) {
        Ok(report) => {
            for error in &report.errors {
                OutputFormatter::error(error);
            }
            OutputFormatter::emit_report(&report);
        }
        Err(e) => OutputFormatter::error(&format!("Watch run failed: {}", e)),
    }
}

/// Creations and modifications matter; everything else is noise for a
/// non-recursive organize loop.
fn is_interesting(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
    )
}
