#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use taskpipe::config::{ConfigFile, RawConfigFile, StageConfig, TaskConfig};
use taskpipe::dag::{Task, TaskRegistry};
use taskpipe::errors::{Result, TaskpipeError};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_global_watch(mut self, pattern: &str) -> Self {
        self.config.default.watch.push(pattern.to_string());
        self
    }

    pub fn with_global_exclude(mut self, pattern: &str) -> Self {
        self.config.default.exclude.push(pattern.to_string());
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.config.debounce_ms = ms;
        self
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn src(mut self, pattern: &str) -> Self {
        self.task.src.push(pattern.to_string());
        self
    }

    pub fn dest(mut self, dir: &str) -> Self {
        self.task.dest = Some(dir.to_string());
        self
    }

    pub fn basename(mut self, name: &str) -> Self {
        self.task.basename = Some(name.to_string());
        self
    }

    pub fn stage(mut self, stage: StageConfig) -> Self {
        self.task.stages.push(stage);
        self
    }

    pub fn minify(mut self, val: bool) -> Self {
        self.task.minify = val;
        self
    }

    pub fn sourcemap(mut self, val: bool) -> Self {
        self.task.sourcemap = val;
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        let watches = self.task.watch.get_or_insert(vec![]);
        watches.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        let excludes = self.task.exclude.get_or_insert(vec![]);
        excludes.push(pattern.to_string());
        self
    }

    pub fn append_default_watch(mut self, val: bool) -> Self {
        self.task.append_default_watch = val;
        self
    }

    pub fn append_default_exclude(mut self, val: bool) -> Self {
        self.task.append_default_exclude = val;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.task.debounce_ms = Some(ms);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

impl Default for TaskConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared log of task bodies that ran, in order.
pub type RunLog = Arc<Mutex<Vec<String>>>;

/// Build a registry of tasks whose bodies only append their name to the
/// returned log. Tasks listed in `failing` return an error instead.
///
/// `tasks` is `(name, prerequisites)` in registration order.
pub fn recording_registry(tasks: &[(&str, &[&str])], failing: &[&str]) -> (TaskRegistry, RunLog) {
    let log: RunLog = Arc::new(Mutex::new(Vec::new()));
    let mut registry = TaskRegistry::new();

    for (name, prerequisites) in tasks {
        let name = name.to_string();
        let fails = failing.contains(&name.as_str());
        let body_log = Arc::clone(&log);
        let body_name = name.clone();
        let task = Task::new(
            name,
            prerequisites.iter().map(|p| p.to_string()).collect(),
            move || {
                body_log.lock().unwrap().push(body_name.clone());
                if fails {
                    Err(TaskpipeError::Other(anyhow::anyhow!("{body_name} exploded")))
                } else {
                    Ok(None)
                }
            },
        );
        registry
            .register(task)
            .expect("test registry has duplicate task names");
    }

    (registry, log)
}
