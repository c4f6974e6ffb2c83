// src/engine/queue.rs

use tracing::debug;

use crate::types::TaskName;

/// Tasks that must run once more once nothing they execute is in flight.
///
/// Depth is 1 per task: queuing a task that is already queued coalesces
/// into the existing entry, so any number of triggers during one run yields
/// exactly one follow-up run.
#[derive(Debug, Default)]
pub struct RerunQueue {
    pending: Vec<TaskName>,
}

impl RerunQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task`. Returns `false` if it was already queued.
    pub fn push(&mut self, task: &str) -> bool {
        if self.contains(task) {
            debug!(task, "rerun already queued; coalescing trigger");
            return false;
        }
        debug!(task, "queued rerun");
        self.pending.push(task.to_string());
        true
    }

    /// Remove `task` from the queue, returning whether it was queued.
    pub fn take(&mut self, task: &str) -> bool {
        match self.pending.iter().position(|t| t == task) {
            Some(idx) => {
                self.pending.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Queued tasks, oldest first.
    pub fn tasks(&self) -> Vec<TaskName> {
        self.pending.clone()
    }

    pub fn contains(&self, task: &str) -> bool {
        self.pending.iter().any(|t| t == task)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
