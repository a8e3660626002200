//! Hot reload of the gateway config file.
//!
//! Each change to the file is reloaded through [`load_with_env`] and compared
//! with the last accepted config. Only reloads that change something are
//! forwarded to the server, and the changed sections are logged. The API key
//! is reported as changed without ever being logged.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_with_env;
use crate::config::schema::GatewayConfig;

pub struct ConfigWatcher {
    path: PathBuf,
    current: GatewayConfig,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// `current` is the config the server was started with.
    pub fn new(
        path: &Path,
        current: GatewayConfig,
    ) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            current,
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut current,
            update_tx,
        } = self;
        let reload_path = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match load_with_env(Some(&reload_path)) {
                        Ok(reloaded) => {
                            let changed = changed_sections(&current, &reloaded);
                            if changed.is_empty() {
                                tracing::debug!("Config file touched, nothing changed");
                                return;
                            }
                            tracing::info!(sections = ?changed, "Gateway config reloaded");
                            current = reloaded.clone();
                            let _ = update_tx.send(reloaded);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Rejected config reload, keeping the running config");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Watching gateway config");
        Ok(watcher)
    }
}

/// Names of the top-level sections that differ between two configs.
pub fn changed_sections(old: &GatewayConfig, new: &GatewayConfig) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if old.listener != new.listener {
        changed.push("listener");
    }
    if old.timeouts != new.timeouts {
        changed.push("timeouts");
    }
    if old.limits != new.limits {
        changed.push("limits");
    }
    if old.rate_limit != new.rate_limit {
        changed.push("rate_limit");
    }
    if old.auth != new.auth {
        changed.push("auth");
    }
    if old.observability != new.observability {
        changed.push("observability");
    }
    changed
}
