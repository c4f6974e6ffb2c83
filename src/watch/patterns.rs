// src/watch/patterns.rs

use std::fmt;
use std::time::Duration;

use anyhow::Context;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::ConfigFile;
use crate::errors::{Result, TaskpipeError};
use crate::types::TaskName;

/// Compiled watch/exclude patterns for one task, plus its debounce window.
///
/// Patterns are relative to the project root; the watcher passes
/// root-relative, forward-slash paths (e.g. `"assets/scss/style.scss"`) into
/// [`WatchSubscription::matches`].
#[derive(Clone)]
pub struct WatchSubscription {
    task: TaskName,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
    debounce: Duration,
}

impl fmt::Debug for WatchSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSubscription")
            .field("task", &self.task)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl WatchSubscription {
    pub fn new(
        task: impl Into<TaskName>,
        watch: &[String],
        exclude: &[String],
        debounce: Duration,
    ) -> Result<Self> {
        let task = task.into();
        let invalid = |e: anyhow::Error| {
            TaskpipeError::WatchSubscription(format!("task '{task}': {e:#}"))
        };

        let watch_set = build_globset(watch).map_err(invalid)?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).map_err(invalid)?)
        };

        Ok(Self {
            task,
            watch_set,
            exclude_set,
            debounce,
        })
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// One subscription per task with a non-empty effective watch list.
///
/// - `append_default_watch = true`: `task.watch + default.watch`.
/// - `task.watch` set: only that.
/// - otherwise: `default.watch`.
///
/// Same rules for `exclude`.
pub fn build_subscriptions(cfg: &ConfigFile) -> Result<Vec<WatchSubscription>> {
    let defaults = cfg.default_section();
    let global_ms = cfg.settings().debounce_ms;
    let mut subscriptions = Vec::new();

    for (name, task) in cfg.tasks() {
        let watch = effective_patterns(
            task.watch.as_ref(),
            &defaults.watch,
            task.append_default_watch,
        );
        if watch.is_empty() {
            continue;
        }
        let exclude = effective_patterns(
            task.exclude.as_ref(),
            &defaults.exclude,
            task.append_default_exclude,
        );

        subscriptions.push(WatchSubscription::new(
            name.clone(),
            &watch,
            &exclude,
            task.effective_debounce(global_ms),
        )?);
    }

    Ok(subscriptions)
}

fn effective_patterns(
    task_list: Option<&Vec<String>>,
    default_list: &[String],
    append_default: bool,
) -> Vec<String> {
    match (task_list, append_default) {
        (Some(list), true) => {
            let mut combined = list.clone();
            combined.extend(default_list.iter().cloned());
            combined
        }
        (Some(list), false) => list.clone(),
        (None, _) => default_list.to_vec(),
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat.trim_start_matches("./"))
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
