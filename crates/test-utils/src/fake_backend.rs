use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use taskpipe::engine::{RunOutcome, RuntimeEvent};
use taskpipe::errors::Result;
use taskpipe::exec::RunBackend;

/// A fake run backend that:
/// - records which tasks were dispatched
/// - reports `RunCompleted` for each of them, after `run_time`
/// - reports `Failed` for tasks listed in `failing`.
pub struct FakeBackend {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    dispatched: Arc<Mutex<Vec<String>>>,
    run_time: Duration,
    failing: HashSet<String>,
}

impl FakeBackend {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        dispatched: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            dispatched,
            run_time: Duration::ZERO,
            failing: HashSet::new(),
        }
    }

    pub fn with_run_time(mut self, run_time: Duration) -> Self {
        self.run_time = run_time;
        self
    }

    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }
}

impl RunBackend for FakeBackend {
    fn dispatch(
        &mut self,
        task: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);
        let run_time = self.run_time;
        let outcome = if self.failing.contains(&task) {
            RunOutcome::Failed(format!("{task} failed"))
        } else {
            RunOutcome::Success
        };

        Box::pin(async move {
            dispatched.lock().unwrap().push(task.clone());
            tokio::spawn(async move {
                if !run_time.is_zero() {
                    tokio::time::sleep(run_time).await;
                }
                let _ = tx.send(RuntimeEvent::RunCompleted { task, outcome }).await;
            });
            Ok(())
        })
    }
}
