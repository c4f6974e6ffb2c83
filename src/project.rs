// src/project.rs

//! Turn a validated `ConfigFile` into registered tasks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ConfigFile, TaskConfig};
use crate::dag::{Scheduler, Task, TaskRegistry};
use crate::errors::{Result, TaskpipeError};
use crate::fs::FileSystem;
use crate::pipeline::{PipelineExecutor, PipelineRun, SourceGlobs};
use crate::plugins::build_stages;
use crate::types::TaskName;

/// Register every configured task, in declaration order. Pipeline tasks
/// read their sources from `root` through `fs` each time they run.
pub fn build_registry(
    cfg: &ConfigFile,
    root: &Path,
    fs: Arc<dyn FileSystem>,
) -> Result<TaskRegistry> {
    let mut registry = TaskRegistry::new();

    for (name, task) in cfg.tasks() {
        let entry = if task.has_pipeline() {
            let body = pipeline_body(name, task, root, Arc::clone(&fs))?;
            Task::new(name.clone(), task.after.clone(), body)
        } else {
            Task::group(name.clone(), task.after.clone())
        };
        registry.register(entry)?;
    }

    Ok(registry)
}

/// Registry plus a scheduler writing through `fs`.
pub fn build_scheduler(cfg: &ConfigFile, root: &Path, fs: Arc<dyn FileSystem>) -> Result<Scheduler> {
    let registry = build_registry(cfg, root, Arc::clone(&fs))?;
    Ok(Scheduler::new(Arc::new(registry), PipelineExecutor::new(fs)))
}

fn pipeline_body(
    name: &TaskName,
    task: &TaskConfig,
    root: &Path,
    fs: Arc<dyn FileSystem>,
) -> Result<impl Fn() -> Result<Option<PipelineRun>> + Send + Sync + 'static> {
    let globs = SourceGlobs::new(&task.src)
        .map_err(|e| TaskpipeError::ConfigError(format!("task '{name}': {e:#}")))?;
    let dest = match task.dest.as_deref() {
        Some(dest) => root.join(dest),
        None => {
            return Err(TaskpipeError::ConfigError(format!(
                "task '{name}' has `src` but no `dest` directory"
            )));
        }
    };

    let name = name.clone();
    let task = task.clone();
    let root: PathBuf = root.to_path_buf();

    Ok(move || {
        let files = globs.collect(fs.as_ref(), &root)?;
        let stages = build_stages(&task)?;
        Ok(Some(PipelineRun {
            task: name.clone(),
            files,
            stages,
            dest: dest.clone(),
        }))
    })
}
