// src/errors.rs

//! Crate-wide error types and result alias.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::TaskName;

/// A pipeline stage failed on a file (or on the whole file set, for merges).
#[derive(Error, Debug)]
#[error("stage '{stage}' failed on '{}': {cause:#}", path.display())]
pub struct TransformError {
    pub stage: String,
    pub path: PathBuf,
    pub cause: anyhow::Error,
}

impl TransformError {
    pub fn new(stage: impl Into<String>, path: impl Into<PathBuf>, cause: anyhow::Error) -> Self {
        Self {
            stage: stage.into(),
            path: path.into(),
            cause,
        }
    }
}

#[derive(Error, Debug)]
pub enum TaskpipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Task already registered: {0}")]
    DuplicateTask(TaskName),

    #[error("Task not found: {0}")]
    UnknownTask(TaskName),

    #[error("Cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<TaskName> },

    #[error(transparent)]
    Transform(#[from] TransformError),

    /// `failed` is the task whose body returned an error; it equals `task`
    /// when the requested task itself failed.
    #[error("{}", task_failed_message(.task, .failed, .source))]
    TaskFailed {
        task: TaskName,
        failed: TaskName,
        source: Box<TaskpipeError>,
    },

    #[error("Watch subscription error: {0}")]
    WatchSubscription(String),

    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl TaskpipeError {
    /// Name of the task whose body actually failed, if this is a task failure.
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            TaskpipeError::TaskFailed { failed, .. } => Some(failed),
            _ => None,
        }
    }

    /// The stage error at the bottom of a task failure, if any.
    pub fn transform_error(&self) -> Option<&TransformError> {
        match self {
            TaskpipeError::Transform(err) => Some(err),
            TaskpipeError::TaskFailed { source, .. } => source.transform_error(),
            _ => None,
        }
    }
}

fn task_failed_message(task: &str, failed: &str, source: &TaskpipeError) -> String {
    if task == failed {
        format!("task '{task}' failed: {source}")
    } else {
        format!("task '{task}' failed because prerequisite '{failed}' failed: {source}")
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TaskpipeError>;
