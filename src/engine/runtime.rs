// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::exec::RunBackend;
use crate::types::TaskName;
use crate::watch::WatcherHandle;

use super::core::WatchCoordinator;
use super::{RunOutcome, RuntimeEvent};

/// Async shell around [`WatchCoordinator`].
///
/// It owns the event channel, the optional filesystem watcher and the run
/// backend; every decision is delegated to the coordinator, fed with the
/// current Tokio instant.
pub struct Runtime<B: RunBackend> {
    core: WatchCoordinator,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    backend: B,
    watcher: Option<WatcherHandle>,
    initial: Vec<TaskName>,
}

impl<B: RunBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("watcher", &self.watcher)
            .finish_non_exhaustive()
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

impl<B: RunBackend> Runtime<B> {
    pub fn new(core: WatchCoordinator, event_rx: mpsc::Receiver<RuntimeEvent>, backend: B) -> Self {
        Self {
            core,
            event_rx,
            backend,
            watcher: None,
            initial: Vec::new(),
        }
    }

    /// Keep `watcher` alive while the runtime runs; it is dropped on shutdown.
    pub fn with_watcher(mut self, watcher: WatcherHandle) -> Self {
        self.watcher = Some(watcher);
        self
    }

    /// Tasks to run once as soon as the loop starts.
    pub fn with_initial_runs(mut self, tasks: Vec<TaskName>) -> Self {
        self.initial = tasks;
        self
    }

    /// Main event loop. Returns after shutdown once in-flight runs have
    /// reported back, or when every event sender is gone.
    pub async fn run(mut self) -> Result<()> {
        info!("taskpipe watch runtime started");

        for task in std::mem::take(&mut self.initial) {
            if let Some(task) = self.core.request_run(&task) {
                self.dispatch(task).await;
            }
        }

        loop {
            // `None` means the next debounce deadline passed first.
            let received = match self.core.next_deadline() {
                Some(deadline) => {
                    tokio::select! {
                        event = self.event_rx.recv() => Some(event),
                        _ = tokio::time::sleep_until(Instant::from_std(deadline)) => None,
                    }
                }
                None => Some(self.event_rx.recv().await),
            };

            let Some(event) = received else {
                self.dispatch_due().await;
                continue;
            };
            let Some(event) = event else {
                info!("runtime event channel closed; exiting");
                break;
            };
            debug!(?event, "runtime received event");

            match event {
                RuntimeEvent::FileChanged(change) => {
                    self.core.on_event(&change, now());
                }
                RuntimeEvent::RunCompleted { task, outcome } => {
                    match &outcome {
                        RunOutcome::Success => debug!(task = %task, "run completed"),
                        RunOutcome::Failed(message) => {
                            warn!(task = %task, "run failed; still watching: {message}")
                        }
                    }
                    for next in self.core.on_run_finished(&task) {
                        self.dispatch(next).await;
                    }
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested");
                    self.core.stop();
                    if let Some(handle) = self.watcher.take() {
                        debug!(root = ?handle.root(), "releasing file watcher");
                    }
                }
            }

            if self.core.is_stopped() {
                if self.core.in_flight_count() == 0 {
                    break;
                }
                info!(
                    in_flight = self.core.in_flight_count(),
                    "waiting for in-flight runs to finish"
                );
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    async fn dispatch_due(&mut self) {
        for task in self.core.poll_due(now()) {
            self.dispatch(task).await;
        }
    }

    async fn dispatch(&mut self, task: TaskName) {
        let mut pending = VecDeque::from([task]);
        while let Some(task) = pending.pop_front() {
            info!(task = %task, "running task");
            if let Err(err) = self.backend.dispatch(task.clone()).await {
                error!(task = %task, "failed to dispatch run: {err}");
                // Nothing will report back for this run.
                pending.extend(self.core.on_run_finished(&task));
            }
        }
    }
}
