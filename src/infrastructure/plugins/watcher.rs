//! Plugin watcher - Reloads the registry when plugin sources change

use std::path::PathBuf;
use std::time::Duration;

use notify::{recommended_watcher, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::application::errors::{PluginError, PluginResult};
use super::loader::PluginLoader;

/// Watches the plugin directory and triggers full reloads
pub struct PluginWatcher;

impl PluginWatcher {
    /// Start watching `loader`'s directory (non-recursive).
    ///
    /// With a zero `debounce` every relevant notification triggers one reload.
    /// Otherwise a burst of notifications is collapsed into a single reload once
    /// the directory has been quiet for `debounce`.
    pub fn watch(loader: PluginLoader, debounce: Duration) -> PluginResult<WatchHandle> {
        let dir = loader.plugin_dir().to_path_buf();
        if !dir.is_dir() {
            return Err(PluginError::DirectoryNotFound(dir));
        }

        let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>(100);
        let mut watcher = recommended_watcher(move |event| {
            // Runs on the notify thread
            let _ = tx.blocking_send(event);
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!("Watching plugin directory: {}", dir.display());

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(Self::reload_loop(rx, stop_rx, loader, debounce));

        Ok(WatchHandle {
            watcher: Some(watcher),
            stop: Some(stop_tx),
            task,
            dir,
        })
    }

    /// First changed plugin source in `event`, if any
    fn changed_source(loader: &PluginLoader, event: notify::Result<notify::Event>) -> Option<PathBuf> {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Plugin watch error: {}", e);
                return None;
            }
        };

        // The loader reads every file; access events would loop.
        if matches!(event.kind, EventKind::Access(_)) {
            return None;
        }

        event.paths.into_iter().find(|p| loader.is_plugin_source(p))
    }

    /// Runs until `stop` fires or is dropped. A reload in progress is finished first.
    async fn reload_loop(
        mut rx: mpsc::Receiver<notify::Result<notify::Event>>,
        mut stop: oneshot::Receiver<()>,
        loader: PluginLoader,
        debounce: Duration,
    ) {
        loop {
            let event = tokio::select! {
                biased;
                _ = &mut stop => return,
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => return,
                },
            };
            let Some(changed) = Self::changed_source(&loader, event) else {
                continue;
            };
            tracing::info!("Reloading plugins due to changes: {}", changed.display());

            if !debounce.is_zero() {
                loop {
                    tokio::select! {
                        biased;
                        _ = &mut stop => return,
                        next = tokio::time::timeout(debounce, rx.recv()) => match next {
                            Ok(Some(_)) => {
                                tracing::debug!("More events during debounce, resetting timer");
                            }
                            Ok(None) => return,
                            Err(_) => break,
                        },
                    }
                }
            }

            let loader = loader.clone();
            match tokio::task::spawn_blocking(move || loader.try_load()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::error!("Failed to reload plugins: {}", e),
                Err(e) => tracing::error!("Plugin reload task failed: {}", e),
            }
        }
    }
}

/// Live watch; dropping it also stops watching
pub struct WatchHandle {
    watcher: Option<RecommendedWatcher>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    dir: PathBuf,
}

impl WatchHandle {
    /// Stop watching.
    ///
    /// Waits for a reload that is already running, so the registry does not
    /// change after this returns.
    pub async fn release(mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.dir) {
                tracing::debug!("Unwatch {} failed: {}", self.dir.display(), e);
            }
        }
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!("Plugin watcher task ended abnormally: {}", e);
        }
        tracing::info!("Plugin watcher stopped");
    }

    pub fn is_active(&self) -> bool {
        self.watcher.is_some() && !self.task.is_finished()
    }
}
