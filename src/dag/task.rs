// src/dag/task.rs

use std::fmt;
use std::sync::Arc;

use crate::errors::Result;
use crate::pipeline::PipelineRun;
use crate::types::TaskName;

/// Executable part of a task. Returning `Some(run)` hands a pipeline to the
/// executor; `None` means the task only groups its prerequisites.
pub type TaskBody = Arc<dyn Fn() -> Result<Option<PipelineRun>> + Send + Sync>;

/// A registered task. Immutable once registered.
#[derive(Clone)]
pub struct Task {
    pub name: TaskName,
    /// Names of the tasks that must complete before this one, as declared.
    pub prerequisites: Vec<TaskName>,
    pub body: TaskBody,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("prerequisites", &self.prerequisites)
            .finish_non_exhaustive()
    }
}

impl Task {
    pub fn new(
        name: impl Into<TaskName>,
        prerequisites: Vec<TaskName>,
        body: impl Fn() -> Result<Option<PipelineRun>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            prerequisites,
            body: Arc::new(body),
        }
    }

    /// A task with no body of its own.
    pub fn group(name: impl Into<TaskName>, prerequisites: Vec<TaskName>) -> Self {
        Self::new(name, prerequisites, || Ok(None))
    }
}
