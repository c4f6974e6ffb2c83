// src/config/model.rs

use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::types::TaskName;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// debounce_ms = 300
///
/// [default]
/// exclude = ["**/*.min.js"]
///
/// [task.customJs]
/// src = ["assets/js/*.js", "!assets/js/*.min.js"]
/// dest = "assets/js"
/// watch = ["assets/js/*.js"]
///
///   [[task.customJs.stages]]
///   kind = "rename"
///   suffix = ".min"
///
///   [[task.customJs.stages]]
///   kind = "uglify"
///   cmd = "uglifyjs"
///
/// [task.default]
/// after = ["customJs"]
/// ```
///
/// Tasks keep their declaration order; it is the registration order used to
/// break ties between independent prerequisites.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub default: DefaultSection,

    #[serde(default)]
    pub task: IndexMap<TaskName, TaskConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    default: DefaultSection,
    task: IndexMap<TaskName, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        default: DefaultSection,
        task: IndexMap<TaskName, TaskConfig>,
    ) -> Self {
        Self {
            config,
            default,
            task,
        }
    }

    /// Global `[config]` section.
    pub fn settings(&self) -> &ConfigSection {
        &self.config
    }

    /// `[default]` section.
    pub fn default_section(&self) -> &DefaultSection {
        &self.default
    }

    /// All tasks, in declaration order.
    pub fn tasks(&self) -> &IndexMap<TaskName, TaskConfig> {
        &self.task
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.task.get(name)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Quiet period after the last matching change before a watched task runs.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[default]` section: watch patterns shared by tasks that don't override them.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultSection {
    #[serde(default)]
    pub watch: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Prerequisites: tasks that must complete before this one.
    #[serde(default)]
    pub after: Vec<TaskName>,

    /// Source globs relative to the project root. Entries starting with `!`
    /// exclude matches.
    #[serde(default)]
    pub src: Vec<String>,

    /// Destination directory relative to the project root.
    #[serde(default)]
    pub dest: Option<String>,

    /// Output base name used by `concat` / `rename` stages that don't set one.
    #[serde(default)]
    pub basename: Option<String>,

    /// When false, minifier stages (`minify_css`, `uglify`) are skipped.
    #[serde(default = "default_true")]
    pub minify: bool,

    /// When false, `sourcemap_init` / `sourcemap_write` stages are skipped.
    #[serde(default = "default_true")]
    pub sourcemap: bool,

    /// Ordered pipeline stages.
    #[serde(default)]
    pub stages: Vec<StageConfig>,

    /// Task-local watch patterns; `None` falls back to `default.watch`.
    #[serde(default)]
    pub watch: Option<Vec<String>>,

    /// Task-local exclude patterns; `None` falls back to `default.exclude`.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// If true, `default.watch` is appended to `task.watch`.
    #[serde(default)]
    pub append_default_watch: bool,

    /// If true, `default.exclude` is appended to `task.exclude`.
    #[serde(default)]
    pub append_default_exclude: bool,

    /// Per-task override of `[config].debounce_ms`.
    #[serde(default)]
    pub debounce_ms: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            after: Vec::new(),
            src: Vec::new(),
            dest: None,
            basename: None,
            minify: true,
            sourcemap: true,
            stages: Vec::new(),
            watch: None,
            exclude: None,
            append_default_watch: false,
            append_default_exclude: false,
            debounce_ms: None,
        }
    }
}

impl TaskConfig {
    /// Whether this task runs a file pipeline (as opposed to only grouping
    /// prerequisites).
    pub fn has_pipeline(&self) -> bool {
        !self.src.is_empty() || !self.stages.is_empty()
    }

    /// Stages left after applying the `minify` / `sourcemap` switches.
    pub fn effective_stages(&self) -> Vec<&StageConfig> {
        self.stages
            .iter()
            .filter(|s| self.minify || !s.is_minifier())
            .filter(|s| self.sourcemap || !s.is_sourcemap())
            .collect()
    }

    pub fn effective_debounce(&self, global_ms: u64) -> Duration {
        Duration::from_millis(self.debounce_ms.unwrap_or(global_ms))
    }
}

/// Output style for the `sass` stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SassStyle {
    #[default]
    Expanded,
    Compressed,
}

/// One `[[task.<name>.stages]]` entry, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageConfig {
    /// Drop files whose virtual path matches the `exclude` regex.
    Filter { exclude: String },

    /// Compile SCSS to CSS.
    Sass {
        #[serde(default)]
        style: SassStyle,
    },

    /// Add vendor prefixes for the given browser targets (e.g. `"ie 8"`).
    Autoprefix {
        #[serde(default)]
        targets: Vec<String>,
    },

    /// Minify CSS.
    MinifyCss {
        #[serde(default)]
        targets: Vec<String>,
    },

    /// Merge all files into one.
    Concat {
        #[serde(default)]
        file: Option<String>,
        #[serde(default)]
        separator: Option<String>,
    },

    /// Rename virtual paths, gulp-rename style.
    Rename {
        #[serde(default)]
        basename: Option<String>,
        #[serde(default)]
        prefix: Option<String>,
        #[serde(default)]
        suffix: Option<String>,
        #[serde(default)]
        extname: Option<String>,
    },

    /// Minify JavaScript by piping it through an external command.
    Uglify {
        cmd: String,
        #[serde(default)]
        args: Vec<String>,
    },

    /// Pipe contents through an arbitrary external command.
    Exec {
        cmd: String,
        #[serde(default)]
        args: Vec<String>,
    },

    /// Start tracking a source-map chain for each file.
    SourcemapInit,

    /// Write `<file>.map` next to each tracked file.
    SourcemapWrite {
        #[serde(default)]
        dir: Option<String>,
    },

    /// Record the current files as outputs and keep going.
    Emit,
}

impl StageConfig {
    /// The `kind` string, used as the stage name in logs and errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            StageConfig::Filter { .. } => "filter",
            StageConfig::Sass { .. } => "sass",
            StageConfig::Autoprefix { .. } => "autoprefix",
            StageConfig::MinifyCss { .. } => "minify_css",
            StageConfig::Concat { .. } => "concat",
            StageConfig::Rename { .. } => "rename",
            StageConfig::Uglify { .. } => "uglify",
            StageConfig::Exec { .. } => "exec",
            StageConfig::SourcemapInit => "sourcemap_init",
            StageConfig::SourcemapWrite { .. } => "sourcemap_write",
            StageConfig::Emit => "emit",
        }
    }

    pub fn is_minifier(&self) -> bool {
        matches!(self, StageConfig::MinifyCss { .. } | StageConfig::Uglify { .. })
    }

    pub fn is_sourcemap(&self) -> bool {
        matches!(
            self,
            StageConfig::SourcemapInit | StageConfig::SourcemapWrite { .. }
        )
    }
}
