// src/dag/scheduler.rs

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::registry::TaskRegistry;
use crate::errors::{Result, TaskpipeError};
use crate::pipeline::{PipelineExecutor, WriteReport};
use crate::types::TaskName;

/// Result of a successful `execute`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks whose bodies ran, in execution order.
    pub executed: Vec<TaskName>,
    /// Write reports of the tasks that ran a pipeline.
    pub reports: Vec<(TaskName, WriteReport)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current DFS path.
    Visiting,
    Done,
}

/// Runs a task after its transitive prerequisites, each exactly once.
#[derive(Debug, Clone)]
pub struct Scheduler {
    registry: Arc<TaskRegistry>,
    executor: PipelineExecutor,
}

impl Scheduler {
    pub fn new(registry: Arc<TaskRegistry>, executor: PipelineExecutor) -> Self {
        Self { registry, executor }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Execution order for `task`: every transitive prerequisite before its
    /// dependents, ties broken by registration order, `task` last.
    ///
    /// Fails with `UnknownTask` or `CyclicDependency` without running
    /// anything.
    pub fn resolve(&self, task: &str) -> Result<Vec<TaskName>> {
        self.registry.lookup(task)?;

        let mut marks: HashMap<TaskName, Mark> = HashMap::new();
        let mut path: Vec<TaskName> = Vec::new();
        let mut order: Vec<TaskName> = Vec::new();
        self.visit(task, &mut marks, &mut path, &mut order)?;

        debug!(task, ?order, "resolved execution order");
        Ok(order)
    }

    fn visit(
        &self,
        name: &str,
        marks: &mut HashMap<TaskName, Mark>,
        path: &mut Vec<TaskName>,
        order: &mut Vec<TaskName>,
    ) -> Result<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| n == name).unwrap_or(0);
                let mut cycle: Vec<TaskName> = path[start..].to_vec();
                cycle.push(name.to_string());
                return Err(TaskpipeError::CyclicDependency { cycle });
            }
            None => {}
        }

        let task = self.registry.lookup(name)?;
        marks.insert(name.to_string(), Mark::Visiting);
        path.push(name.to_string());

        let mut prerequisites: Vec<&TaskName> = task.prerequisites.iter().collect();
        // Unknown names sort last; `visit` reports them.
        prerequisites.sort_by_key(|p| self.registry.position(p).unwrap_or(usize::MAX));
        for prerequisite in prerequisites {
            self.visit(prerequisite, marks, path, order)?;
        }

        path.pop();
        marks.insert(name.to_string(), Mark::Done);
        order.push(name.to_string());
        Ok(())
    }

    /// Resolve `task` and run every body in order.
    ///
    /// The first failing body stops the run; the error names both the
    /// requested task and the one that failed.
    pub fn execute(&self, task: &str) -> Result<RunSummary> {
        let order = self.resolve(task)?;
        let mut summary = RunSummary::default();

        for name in order {
            let entry = self.registry.lookup(&name)?;
            debug!(task = %name, "starting task");

            let outcome = (entry.body)().and_then(|run| match run {
                Some(run) => self.executor.execute(run).map(Some),
                None => Ok(None),
            });

            match outcome {
                Ok(report) => {
                    info!(task = %name, "task finished");
                    if let Some(report) = report {
                        summary.reports.push((name.clone(), report));
                    }
                    summary.executed.push(name);
                }
                Err(err) => {
                    warn!(task = %name, requested = task, error = %err, "task failed");
                    return Err(TaskpipeError::TaskFailed {
                        task: task.to_string(),
                        failed: name,
                        source: Box::new(err),
                    });
                }
            }
        }

        Ok(summary)
    }
}
