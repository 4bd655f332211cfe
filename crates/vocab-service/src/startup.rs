//! Startup orchestration.
//!
//! [`Service::with_defaults`] registers the built-in loaders and builds the
//! store; [`initialize`] validates the configured roots and spawns the
//! background task that performs the initial load and starts the watchdogs.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use vocab_loader::{check_source_root, LoadError, LoaderRegistry, Reloader, SchemaRegistry, SourceKind, VocabularyStore};

use crate::config::ServiceConfig;
use crate::engine::ValidationEngine;
use crate::error::StartupError;
use crate::watchdog::WatchdogHandle;

/// The validation engine and the reloader sharing one store.
#[derive(Debug, Clone)]
pub struct Service {
    /// Query facade.
    pub engine: ValidationEngine,
    /// Rebuild entry point used by the initial load and the watchdogs.
    pub reloader: Arc<Reloader>,
}

impl Service {
    /// Registers every built-in loader and builds an empty store.
    pub fn with_defaults(config: &ServiceConfig) -> Self {
        tracing::info!("Registering loaders...");
        let mut schema = SchemaRegistry::new();
        let loaders = LoaderRegistry::with_defaults(&mut schema);
        Self::new(schema, loaders, config)
    }

    /// Builds a service from explicitly registered schema and loaders.
    pub fn new(schema: SchemaRegistry, loaders: LoaderRegistry, config: &ServiceConfig) -> Self {
        let store = Arc::new(VocabularyStore::new(schema));
        let engine = ValidationEngine::new(Arc::clone(&store)).with_display_name_lookup(config.display_name_lookup);
        let reloader = Arc::new(Reloader::new(store, Arc::new(loaders)));
        Self { engine, reloader }
    }
}

/// The background initializer. Await [`join`](Self::join) to get the
/// running watchdogs.
#[derive(Debug)]
pub struct StartupHandle {
    task: JoinHandle<Vec<WatchdogHandle>>,
}

impl StartupHandle {
    /// Waits for the initial load to finish and returns the watchdogs.
    pub async fn join(self) -> Result<Vec<WatchdogHandle>, StartupError> {
        Ok(self.task.await?)
    }

    /// True once the initial load has finished and the watchdogs are running.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Returns the root if it is usable, `None` if it is unset or missing.
fn usable_root(kind: SourceKind, root: Option<&PathBuf>) -> Result<Option<PathBuf>, StartupError> {
    let Some(root) = root else {
        return Ok(None);
    };
    match check_source_root(root) {
        Ok(()) => Ok(Some(root.clone())),
        Err(LoadError::DirectoryNotFound { path }) => {
            tracing::warn!("{} source directory {} does not exist, skipping", kind, path);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Validates the configured roots and spawns the initializer.
///
/// With `load_at_startup`, both roots are loaded and published with one
/// swap, then reloaded into the other generation. A failed initial load is
/// logged; the watchdogs start either way so later changes are picked up.
///
/// # Errors
/// Returns [`StartupError::Source`] if a configured root exists but is not
/// a directory. Must be called from within a tokio runtime.
pub fn initialize(config: &ServiceConfig, reloader: Arc<Reloader>) -> Result<StartupHandle, StartupError> {
    let code_root = usable_root(SourceKind::Code, config.code_directory.as_ref())?;
    let value_set_root = usable_root(SourceKind::ValueSet, config.value_set_directory.as_ref())?;
    let load_at_startup = config.load_at_startup;
    let debounce = config.watch_debounce;

    let task = tokio::spawn(async move {
        if load_at_startup {
            let loader = Arc::clone(&reloader);
            let (code, value_sets) = (code_root.clone(), value_set_root.clone());
            let outcome =
                tokio::task::spawn_blocking(move || loader.reload_all(code.as_deref(), value_sets.as_deref())).await;
            match outcome {
                Ok(Ok(reports)) => tracing::info!("Initial load finished ({} streams)", reports.len()),
                Ok(Err(e)) => tracing::error!("Failed to load configured vocabulary directories: {}", e),
                Err(e) => tracing::error!("Initial load task failed: {}", e),
            }
        } else {
            tracing::info!("Skipping initial load");
        }

        let mut watchdogs = Vec::new();
        for (kind, root) in [(SourceKind::Code, code_root), (SourceKind::ValueSet, value_set_root)] {
            let Some(root) = root else { continue };
            match WatchdogHandle::start(kind, root, Arc::clone(&reloader), debounce) {
                Ok(handle) => watchdogs.push(handle),
                Err(e) => tracing::error!("Failed to start {} watchdog: {}", kind, e),
            }
        }
        watchdogs
    });

    Ok(StartupHandle { task })
}

/// Stops every watchdog.
pub async fn shutdown(watchdogs: Vec<WatchdogHandle>) {
    for watchdog in watchdogs {
        watchdog.stop().await;
    }
}
