// src/dag/registry.rs

use indexmap::IndexMap;
use tracing::debug;

use crate::dag::task::Task;
use crate::errors::{Result, TaskpipeError};
use crate::types::TaskName;

/// Named tasks, in registration order.
///
/// Prerequisites are not checked at registration time, so tasks may be
/// registered in any order; unknown prerequisites surface when the
/// scheduler resolves a run.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: IndexMap<TaskName, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.name) {
            return Err(TaskpipeError::DuplicateTask(task.name));
        }
        debug!(task = %task.name, prerequisites = ?task.prerequisites, "registered task");
        self.tasks.insert(task.name.clone(), task);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&Task> {
        self.tasks
            .get(name)
            .ok_or_else(|| TaskpipeError::UnknownTask(name.to_string()))
    }

    /// Position of `name` in registration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.tasks.get_index_of(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
