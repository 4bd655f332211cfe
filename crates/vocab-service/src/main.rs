//! Code validator binary.

use std::time::{Duration, Instant};

use vocab_service::{initialize, shutdown, Service, ServiceConfig, StartupError, StartupHandle, WatchdogHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServiceConfig::from_env()?;
    tracing::info!(
        "Code directory: {}, value set directory: {}, load at startup: {}",
        describe_dir(config.code_directory.as_deref()),
        describe_dir(config.value_set_directory.as_deref()),
        config.load_at_startup
    );

    let service = Service::with_defaults(&config);
    let startup = initialize(&config, service.reloader.clone())?;
    tracing::info!("Validation engine ready; initial load running in the background");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    let watchdogs = if startup.is_finished() {
        startup.join().await?
    } else {
        wait_for_startup(startup).await?
    };
    shutdown(watchdogs).await;

    let store = service.engine.store();
    tracing::info!(
        "Stopped with generation {} active ({} open connections)",
        store.active_label(),
        store.open_connections()
    );
    Ok(())
}

/// Waits for a running initial load, logging while it runs. A second
/// Ctrl-C exits without waiting.
async fn wait_for_startup(startup: StartupHandle) -> Result<Vec<WatchdogHandle>, StartupError> {
    tracing::info!("Waiting for the initial load to finish (Ctrl-C again to exit now)...");
    let started = Instant::now();
    let join = startup.join();
    tokio::pin!(join);
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut progress = tokio::time::interval(PROGRESS_INTERVAL);
    progress.tick().await;

    loop {
        tokio::select! {
            joined = &mut join => return joined,
            _ = &mut interrupt => {
                tracing::warn!("Exiting before the initial load finished");
                std::process::exit(130);
            }
            _ = progress.tick() => {
                tracing::info!("Initial load still running after {:.0?}", started.elapsed());
            }
        }
    }
}

fn describe_dir(path: Option<&std::path::Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not configured)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_describe_dir_in_log_line() {
        let line = format!(
            "{} / {}",
            describe_dir(Some(Path::new("/data/codes"))),
            describe_dir(None)
        );
        assert_eq!(line, "/data/codes / (not configured)");
        tracing::info!("Code directory: {}", describe_dir(None));
    }
}
