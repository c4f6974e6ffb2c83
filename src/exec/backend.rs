// src/exec/backend.rs

//! Pluggable run backend.
//!
//! The runtime hands due tasks to a `RunBackend` instead of calling the
//! scheduler directly, so tests can swap in a fake that records dispatches
//! and reports completions without touching the filesystem.
//!
//! A backend must eventually send exactly one
//! `RuntimeEvent::RunCompleted` for every task it accepted.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::dag::Scheduler;
use crate::engine::{RunOutcome, RuntimeEvent};
use crate::errors::Result;
use crate::types::TaskName;

pub trait RunBackend: Send {
    /// Start a run of `task`. Returns once the run is started, not finished.
    fn dispatch(
        &mut self,
        task: TaskName,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs tasks through the [`Scheduler`] on Tokio's blocking pool.
pub struct SchedulerBackend {
    scheduler: Arc<Scheduler>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl SchedulerBackend {
    pub fn new(scheduler: Arc<Scheduler>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            scheduler,
            runtime_tx,
        }
    }
}

impl RunBackend for SchedulerBackend {
    fn dispatch(
        &mut self,
        task: TaskName,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let scheduler = Arc::clone(&self.scheduler);
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            tokio::spawn(async move {
                let name = task.clone();
                let joined = tokio::task::spawn_blocking(move || scheduler.execute(&name)).await;

                let outcome = match joined {
                    Ok(Ok(summary)) => {
                        info!(task = %task, executed = ?summary.executed, "watch run finished");
                        RunOutcome::Success
                    }
                    Ok(Err(err)) => {
                        let stage = err.transform_error().map(|t| t.stage.clone());
                        error!(task = %task, failed = ?err.failed_task(), ?stage, "{err}");
                        RunOutcome::Failed(err.to_string())
                    }
                    Err(join_err) => {
                        error!(task = %task, "run panicked or was cancelled: {join_err}");
                        RunOutcome::Failed(join_err.to_string())
                    }
                };

                if tx
                    .send(RuntimeEvent::RunCompleted { task, outcome })
                    .await
                    .is_err()
                {
                    error!("runtime channel closed before run completion was reported");
                }
            });
            Ok(())
        })
    }
}
