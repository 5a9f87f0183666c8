//! Hot-reload watcher for resource scripts

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Errors from setting up the watcher
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Configuration for the resource watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce duration to avoid multiple reloads for rapid file changes
    pub debounce_duration: Duration,
    /// Extension of watched scripts, without the dot
    pub script_extension: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_millis(300),
            script_extension: "rhai".to_string(),
        }
    }
}

/// Watches the resource root and reports which resources changed
///
/// Events are collected on notify's thread and drained by [`poll`](Self::poll)
/// on the host thread, which owns the runtime and does the restarting.
pub struct ResourceWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
    config: WatcherConfig,
    events: Receiver<Event>,
    last_reported: HashMap<String, Instant>,
}

impl ResourceWatcher {
    /// Start watching `root` (non-recursively)
    pub fn new<P: AsRef<Path>>(root: P, config: WatcherConfig) -> Result<Self, WatchError> {
        let root = root.as_ref().to_path_buf();
        info!(path = ?root, "Creating resource watcher");

        let (event_tx, event_rx) = mpsc::channel::<Event>();
        let mut watcher = RecommendedWatcher::new(
            move |res| match res {
                Ok(event) => {
                    // Receiver gone means the watcher is being dropped
                    let _ = event_tx.send(event);
                }
                Err(e) => error!(error = %e, "File watcher error"),
            },
            Config::default(),
        )?;

        watcher.watch(&root, RecursiveMode::NonRecursive)?;
        debug!(path = ?root, "Started watching for resource changes");

        Ok(Self {
            _watcher: watcher,
            root,
            config,
            events: event_rx,
            last_reported: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of resources whose scripts changed since the last poll
    ///
    /// Never blocks. A resource reported within the debounce window is not
    /// reported again.
    pub fn poll(&mut self) -> Vec<String> {
        let mut changed = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        continue;
                    }
                    for path in &event.paths {
                        if let Some(name) = self.resource_name(path) {
                            if !changed.contains(&name) {
                                changed.push(name);
                            }
                        }
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("Event channel disconnected");
                    break;
                }
            }
        }

        let now = Instant::now();
        changed.retain(|name| self.should_report(name, now));
        if !changed.is_empty() {
            info!(resources = ?changed, "Resource scripts changed");
        }
        changed
    }

    fn resource_name(&self, path: &Path) -> Option<String> {
        if path.extension()?.to_str()? != self.config.script_extension {
            return None;
        }
        path.file_stem()?.to_str().map(str::to_string)
    }

    fn should_report(&mut self, name: &str, now: Instant) -> bool {
        match self.last_reported.get(name) {
            Some(last) if now.duration_since(*last) < self.config.debounce_duration => {
                debug!(resource = name, "Debouncing rapid file changes");
                false
            }
            _ => {
                self.last_reported.insert(name.to_string(), now);
                true
            }
        }
    }
}
