//! Source directory watchdog.
//!
//! A watchdog watches one source root recursively. Any change marks the
//! stream dirty and wakes a worker task, which waits out the debounce
//! period and then runs one rebuild-and-swap cycle on the blocking pool.
//! Changes that arrive while a cycle is pending or running collapse into a
//! single follow-up cycle.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use vocab_loader::{Reloader, SourceKind};

use crate::error::WatchError;

#[derive(Debug, Default)]
struct Signal {
    dirty: AtomicBool,
    wake: Notify,
    shutdown: Notify,
    cycles: AtomicU64,
}

impl Signal {
    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
        self.wake.notify_one();
    }
}

/// A running watchdog. Dropping the handle without calling
/// [`stop`](Self::stop) detaches the worker but stops file events.
#[derive(Debug)]
pub struct WatchdogHandle {
    kind: SourceKind,
    root: PathBuf,
    signal: Arc<Signal>,
    worker: JoinHandle<()>,
    _watcher: RecommendedWatcher,
}

impl WatchdogHandle {
    /// Starts watching `root` and reloading `kind` through `reloader`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        kind: SourceKind,
        root: impl Into<PathBuf>,
        reloader: Arc<Reloader>,
        debounce: Duration,
    ) -> Result<Self, WatchError> {
        let root = root.into();
        let signal = Arc::new(Signal::default());

        let mut watcher = watch(&root, Arc::clone(&signal))?;
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Notify {
                path: root.clone(),
                source,
            })?;

        let worker = tokio::spawn(run(kind, root.clone(), reloader, Arc::clone(&signal), debounce));
        tracing::info!("Started {} watchdog on {}", kind, root.display());

        Ok(Self {
            kind,
            root,
            signal,
            worker,
            _watcher: watcher,
        })
    }

    /// Stream this watchdog reloads.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Root being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Schedules a cycle as if a file had changed.
    pub fn trigger(&self) {
        self.signal.mark_dirty();
    }

    /// Number of cycles run so far, successful or not.
    pub fn cycles(&self) -> u64 {
        self.signal.cycles.load(Ordering::Acquire)
    }

    /// Stops watching and waits for the worker to exit. A cycle already
    /// running is allowed to finish.
    pub async fn stop(self) {
        let Self {
            kind,
            root,
            signal,
            worker,
            _watcher,
        } = self;
        drop(_watcher);
        signal.shutdown.notify_one();

        if let Err(e) = worker.await {
            tracing::error!("{} watchdog on {} exited abnormally: {}", kind, root.display(), e);
        }
        tracing::info!("Stopped {} watchdog on {}", kind, root.display());
    }
}

fn watch(root: &Path, signal: Arc<Signal>) -> Result<RecommendedWatcher, WatchError> {
    let watched = root.to_path_buf();
    notify::recommended_watcher(move |event: notify::Result<notify::Event>| match event {
        Ok(event) if matches!(event.kind, EventKind::Access(_)) => {}
        Ok(event) => {
            tracing::debug!("Change under {}: {:?} {:?}", watched.display(), event.kind, event.paths);
            signal.mark_dirty();
        }
        Err(e) => tracing::warn!("Watch error under {}: {}", watched.display(), e),
    })
    .map_err(|source| WatchError::Notify {
        path: root.to_path_buf(),
        source,
    })
}

async fn run(kind: SourceKind, root: PathBuf, reloader: Arc<Reloader>, signal: Arc<Signal>, debounce: Duration) {
    loop {
        tokio::select! {
            _ = signal.shutdown.notified() => break,
            _ = signal.wake.notified() => {}
        }
        tokio::select! {
            _ = signal.shutdown.notified() => break,
            _ = tokio::time::sleep(debounce) => {}
        }

        // A wake-up left over from a change already covered by the last cycle.
        if !signal.dirty.swap(false, Ordering::AcqRel) {
            continue;
        }

        tracing::info!("Change detected under {}, reloading {} sources", root.display(), kind);
        let cycle_reloader = Arc::clone(&reloader);
        let cycle_root = root.clone();
        let outcome = tokio::task::spawn_blocking(move || cycle_reloader.reload(kind, &cycle_root)).await;
        match outcome {
            Ok(Ok(_)) => {}
            // already logged by the reloader
            Ok(Err(_)) => {}
            Err(e) => tracing::error!("{} reload task failed: {}", kind, e),
        }
        signal.cycles.fetch_add(1, Ordering::AcqRel);
    }
}
