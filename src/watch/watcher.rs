// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::errors::{Result, TaskpipeError};
use crate::pipeline::executor::TEMP_SUFFIX;
use crate::types::{ChangeEvent, ChangeKind};
use crate::watch::path_utils::relative_str;

/// Keeps the filesystem subscription alive. Dropping it releases the watch.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    root: PathBuf,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl WatcherHandle {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Watch `root` recursively and forward every change below it to the
/// runtime as `RuntimeEvent::FileChanged` with a root-relative path.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    if !root.is_dir() {
        return Err(TaskpipeError::WatchSubscription(format!(
            "project root {} is not a readable directory",
            root.display()
        )));
    }
    let root = root.canonicalize().unwrap_or(root);

    // notify calls back on its own thread; hop into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("taskpipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("taskpipe: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .map_err(|e| TaskpipeError::WatchSubscription(e.to_string()))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| {
            TaskpipeError::WatchSubscription(format!("watching {}: {e}", root.display()))
        })?;

    info!("file watcher started on {:?}", root);

    let async_root = root.clone();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let Some(kind) = ChangeKind::from_notify(&event.kind) else {
                continue;
            };
            for path in event.paths {
                let Some(rel) = relative_str(&async_root, &path) else {
                    debug!(?path, "ignoring change outside the project root");
                    continue;
                };
                if rel.is_empty() || rel.ends_with(TEMP_SUFFIX) {
                    continue;
                }
                let change = ChangeEvent::new(rel, kind);
                if runtime_tx.send(RuntimeEvent::FileChanged(change)).await.is_err() {
                    debug!("runtime channel closed; stopping watcher forwarding");
                    return;
                }
            }
        }
        warn!("watcher event stream ended");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        root,
    })
}
