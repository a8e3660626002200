//! Startup orchestration.
//!
//! Binds the listener, starts the config watcher, runs the server and waits
//! for a shutdown signal. In-flight requests get `timeouts.shutdown_secs` to
//! finish before the server task is abandoned.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::watcher::ConfigWatcher;
use crate::config::{ConfigError, GatewayConfig};
use crate::database::Backends;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Run the gateway until SIGINT/SIGTERM.
///
/// `config_path`, when it points at an existing file, is watched for changes.
pub async fn serve(
    config: GatewayConfig,
    config_path: Option<PathBuf>,
    backends: Backends,
) -> Result<(), StartupError> {
    let grace = Duration::from_secs(config.timeouts.shutdown_secs);
    let server = HttpServer::new(config.clone(), backends)?;

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Dropping the watcher stops it, so it lives until this function returns.
    let (_watcher, updates) = match config_path.filter(|path| path.exists()) {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path, config);
            match watcher.run() {
                Ok(handle) => (Some(handle), updates),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                    (None, updates)
                }
            }
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, updates, shutdown.subscribe()));

    tokio::select! {
        _ = signals::shutdown_signal() => {}
        result = &mut server_task => {
            tracing::error!("Server exited before shutdown was requested");
            return Ok(result??);
        }
    }

    let tasks = shutdown.trigger();
    tracing::info!(tasks, grace_secs = grace.as_secs(), "Stopping gateway");

    match tokio::time::timeout(grace, server_task).await {
        Ok(result) => Ok(result??),
        Err(_) => {
            tracing::warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out, forcing exit");
            Ok(())
        }
    }
}
