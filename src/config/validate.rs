// src/config/validate.rs

use std::path::{Component, Path};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile, StageConfig, TaskConfig};
use crate::errors::{Result, TaskpipeError};
use crate::pipeline::sources::SourceGlobs;
use crate::plugins::css::parse_targets;
use crate::types::TaskName;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TaskpipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.default, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    for (name, task) in cfg.task.iter() {
        validate_pipeline(name, task)?;
    }
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(TaskpipeError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.debounce_ms == 0 {
        return Err(TaskpipeError::ConfigError(
            "[config].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    for (name, task) in cfg.task.iter() {
        if task.debounce_ms == Some(0) {
            return Err(TaskpipeError::ConfigError(format!(
                "task '{name}': debounce_ms must be >= 1 (got 0)"
            )));
        }
    }

    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if dep == name {
                return Err(TaskpipeError::CyclicDependency {
                    cycle: vec![name.clone(), name.clone()],
                });
            }
            if !cfg.task.contains_key(dep) {
                return Err(TaskpipeError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task. For `[task.B] after = ["A"]` we add A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let start = cycle.node_id();
            let path = cycle_through(cfg, start).unwrap_or_else(|| vec![start.to_string()]);
            Err(TaskpipeError::CyclicDependency { cycle: path })
        }
    }
}

/// Walk `after` edges from `start` until we come back to it, returning the
/// closed path (`[start, .., start]`).
fn cycle_through(cfg: &RawConfigFile, start: &str) -> Option<Vec<TaskName>> {
    fn walk(
        cfg: &RawConfigFile,
        start: &str,
        current: &str,
        path: &mut Vec<TaskName>,
        seen: &mut Vec<TaskName>,
    ) -> bool {
        let Some(task) = cfg.task.get(current) else {
            return false;
        };
        for dep in task.after.iter() {
            if dep == start {
                path.push(dep.clone());
                return true;
            }
            if seen.contains(dep) {
                continue;
            }
            seen.push(dep.clone());
            path.push(dep.clone());
            if walk(cfg, start, dep, path, seen) {
                return true;
            }
            path.pop();
        }
        false
    }

    let mut path = vec![start.to_string()];
    let mut seen = Vec::new();
    if walk(cfg, start, start, &mut path, &mut seen) {
        Some(path)
    } else {
        None
    }
}

fn validate_pipeline(name: &str, task: &TaskConfig) -> Result<()> {
    if !task.has_pipeline() {
        return Ok(());
    }

    if task.src.is_empty() {
        return Err(TaskpipeError::ConfigError(format!(
            "task '{name}' has stages but no `src` globs"
        )));
    }
    if task.dest.is_none() {
        return Err(TaskpipeError::ConfigError(format!(
            "task '{name}' has `src` but no `dest` directory"
        )));
    }

    SourceGlobs::new(&task.src)
        .map_err(|e| TaskpipeError::ConfigError(format!("task '{name}': {e:#}")))?;

    for stage in task.stages.iter() {
        validate_stage(name, task, stage)?;
    }

    Ok(())
}

fn validate_stage(name: &str, task: &TaskConfig, stage: &StageConfig) -> Result<()> {
    let kind = stage.kind_name();
    let invalid = |msg: String| {
        TaskpipeError::ConfigError(format!("task '{name}', stage '{kind}': {msg}"))
    };

    match stage {
        StageConfig::Filter { exclude } => {
            Regex::new(exclude).map_err(|e| invalid(format!("invalid regex: {e}")))?;
        }
        StageConfig::Autoprefix { targets } | StageConfig::MinifyCss { targets } => {
            parse_targets(targets).map_err(|e| invalid(format!("{e:#}")))?;
        }
        StageConfig::Uglify { cmd, .. } | StageConfig::Exec { cmd, .. } => {
            if cmd.trim().is_empty() {
                return Err(invalid("`cmd` must not be empty".to_string()));
            }
        }
        StageConfig::SourcemapWrite { dir: Some(dir) } => {
            let escapes = Path::new(dir)
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if escapes {
                return Err(invalid(format!(
                    "`dir` must be a relative path without `..` (got {dir:?})"
                )));
            }
        }
        StageConfig::Concat { file: Some(file), .. } if file.trim().is_empty() => {
            return Err(invalid("`file` must not be empty".to_string()));
        }
        StageConfig::Concat { file: None, .. } if task.basename.is_none() => {
            return Err(invalid(
                "needs a `file` or a task-level `basename`".to_string(),
            ));
        }
        _ => {}
    }

    Ok(())
}
