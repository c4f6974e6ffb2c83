// src/plugins/mod.rs

//! Built-in stages and the mapping from `[[task.<name>.stages]]` entries to
//! pipeline `Stage`s.

pub mod concat;
pub mod css;
pub mod exec;
pub mod filter;
pub mod rename;
pub mod sourcemaps;

use std::path::PathBuf;

use anyhow::{Result, anyhow};

use crate::config::{StageConfig, TaskConfig};
use crate::pipeline::Stage;

pub use concat::Concat;
pub use css::{Autoprefix, MinifyCss, Sass, parse_targets};
pub use exec::ExternalCommand;
pub use filter::Filter;
pub use rename::Rename;
pub use sourcemaps::{SourcemapInit, SourcemapWrite};

/// Stages for `task`, after the `minify` / `sourcemap` switches.
pub fn build_stages(task: &TaskConfig) -> Result<Vec<Stage>> {
    task.effective_stages()
        .into_iter()
        .map(|stage| build_stage(stage, task))
        .collect()
}

pub fn build_stage(stage: &StageConfig, task: &TaskConfig) -> Result<Stage> {
    let name = stage.kind_name();
    let built = match stage {
        StageConfig::Filter { exclude } => Stage::transform(name, Filter::new(exclude)?),
        StageConfig::Sass { style } => Stage::transform(name, Sass { style: *style }),
        StageConfig::Autoprefix { targets } => Stage::transform(
            name,
            Autoprefix {
                targets: parse_targets(targets)?,
            },
        ),
        StageConfig::MinifyCss { targets } => Stage::transform(
            name,
            MinifyCss {
                targets: parse_targets(targets)?,
            },
        ),
        StageConfig::Concat { file, separator } => {
            let file = match (file, task.basename.as_ref()) {
                (Some(file), _) => PathBuf::from(file),
                (None, Some(basename)) => PathBuf::from(format!("{basename}.js")),
                (None, None) => {
                    return Err(anyhow!("concat stage needs a `file` or a task `basename`"));
                }
            };
            Stage::merge(name, Concat::new(file, separator.clone()))
        }
        StageConfig::Rename {
            basename,
            prefix,
            suffix,
            extname,
        } => Stage::transform(
            name,
            Rename {
                basename: basename.clone().or_else(|| task.basename.clone()),
                prefix: prefix.clone(),
                suffix: suffix.clone(),
                extname: extname.clone(),
            },
        ),
        StageConfig::Uglify { cmd, args } => {
            Stage::transform(name, ExternalCommand::js_minifier(cmd, args)?)
        }
        StageConfig::Exec { cmd, args } => Stage::transform(name, ExternalCommand::new(cmd, args)?),
        StageConfig::SourcemapInit => Stage::transform(name, SourcemapInit),
        StageConfig::SourcemapWrite { dir } => Stage::transform(
            name,
            SourcemapWrite {
                dir: dir.as_ref().map(PathBuf::from),
            },
        ),
        StageConfig::Emit => Stage::emit(),
    };
    Ok(built)
}
