// src/pipeline/executor.rs

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::errors::{Result, TaskpipeError, TransformError};
use crate::fs::FileSystem;
use crate::pipeline::file::VirtualFile;
use crate::pipeline::stage::{Stage, StageKind};
use crate::types::TaskName;

/// Suffix of the temporary siblings outputs are staged in before renaming.
pub const TEMP_SUFFIX: &str = ".taskpipe-tmp";

/// Stage name reported when the input file set itself has colliding paths.
const INPUT_STAGE: &str = "src";

/// One execution of a task's stages over a fixed set of input files.
#[derive(Debug)]
pub struct PipelineRun {
    pub task: TaskName,
    pub files: Vec<VirtualFile>,
    pub stages: Vec<Stage>,
    /// Destination directory the resulting virtual paths are written under.
    pub dest: PathBuf,
}

/// What a successful run did on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    /// Outputs whose contents already matched the file on disk.
    pub unchanged: Vec<PathBuf>,
}

/// Runs stages over file sets and writes the results.
///
/// Every file finishes stage *i* before any file enters stage *i + 1*.
/// Nothing is written unless all stages succeed; outputs are first written
/// to temporary siblings and only renamed into place once all of them exist.
/// If a rename fails, outputs already moved are rolled back and the previous
/// files restored.
#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    fs: Arc<dyn FileSystem>,
}

impl PipelineExecutor {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Apply `stages` in order and return the output files: every `emit`
    /// snapshot plus the final file set, keyed by path (later wins).
    pub fn transform(
        &self,
        files: Vec<VirtualFile>,
        stages: &[Stage],
    ) -> std::result::Result<Vec<VirtualFile>, TransformError> {
        ensure_unique_paths(INPUT_STAGE, &files)?;
        let mut current = files;
        let mut outputs: BTreeMap<PathBuf, VirtualFile> = BTreeMap::new();

        for stage in stages {
            debug!(stage = %stage.name(), files = current.len(), "entering stage");
            current = match stage.kind() {
                StageKind::Transform(transform) => {
                    let results: Vec<_> = current
                        .into_par_iter()
                        .map(|mut file| {
                            let path = file.path.clone();
                            file.record_stage(stage.name());
                            (path, transform.transform(file))
                        })
                        .collect();

                    let mut next = Vec::with_capacity(results.len());
                    for (path, result) in results {
                        let output =
                            result.map_err(|e| TransformError::new(stage.name(), path, e))?;
                        next.extend(output.into_files());
                    }
                    ensure_unique_paths(stage.name(), &next)?;
                    next
                }
                StageKind::Merge(merge) => {
                    if current.is_empty() {
                        Vec::new()
                    } else {
                        let mut inputs = current;
                        inputs.sort_by(|a, b| a.original.cmp(&b.original));
                        let first = inputs[0].path.clone();
                        let merged = merge
                            .merge(inputs)
                            .map_err(|e| TransformError::new(stage.name(), first, e))?;
                        vec![merged]
                    }
                }
                StageKind::Emit => {
                    for file in current.iter() {
                        outputs.insert(file.path.clone(), file.clone());
                    }
                    current
                }
            };
        }

        for file in current {
            if outputs.contains_key(&file.path) {
                debug!(path = ?file.path, "final output replaces emitted checkpoint");
            }
            outputs.insert(file.path.clone(), file);
        }

        Ok(outputs.into_values().collect())
    }

    /// Transform the run's files and write the outputs under `run.dest`.
    pub fn execute(&self, run: PipelineRun) -> Result<WriteReport> {
        let PipelineRun {
            task,
            files,
            stages,
            dest,
        } = run;

        info!(task = %task, inputs = files.len(), stages = stages.len(), "running pipeline");
        let outputs = self.transform(files, &stages)?;
        let report = self.write_outputs(&dest, &outputs)?;
        info!(
            task = %task,
            written = report.written.len(),
            unchanged = report.unchanged.len(),
            "pipeline finished"
        );
        Ok(report)
    }

    /// Write files under `dest`, all or nothing.
    pub fn write_outputs(&self, dest: &Path, files: &[VirtualFile]) -> Result<WriteReport> {
        let mut report = WriteReport::default();
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();

        for file in files {
            ensure_relative(&file.path)?;
        }

        for file in files {
            let target = dest.join(&file.path);

            if self.is_unchanged(&target, &file.contents) {
                debug!(path = ?target, "output unchanged; skipping write");
                report.unchanged.push(target);
                continue;
            }

            let tmp = temp_sibling(&target);
            if let Err(err) = self.fs.write(&tmp, &file.contents) {
                self.discard(&staged);
                return Err(TaskpipeError::Other(
                    err.context(format!("writing output {}", target.display())),
                ));
            }
            staged.push((tmp, target));
        }

        let mut committed: Vec<Committed> = Vec::with_capacity(staged.len());
        for (idx, (tmp, target)) in staged.iter().enumerate() {
            match self.commit(tmp, target) {
                Ok(done) => committed.push(done),
                Err(err) => {
                    self.roll_back(&committed);
                    self.discard(&staged[idx..]);
                    return Err(TaskpipeError::Other(
                        err.context(format!("moving output into place: {}", target.display())),
                    ));
                }
            }
        }

        for done in committed {
            if let Some(backup) = done.backup {
                if let Err(err) = self.fs.remove_file(&backup) {
                    warn!(path = ?backup, error = %err, "failed to remove previous output");
                }
            }
            report.written.push(done.target);
        }

        Ok(report)
    }

    /// Move `tmp` onto `target`, keeping any previous file at `target` aside
    /// until the whole run is in place.
    fn commit(&self, tmp: &Path, target: &Path) -> anyhow::Result<Committed> {
        let backup = if self.fs.is_file(target) {
            let backup = backup_sibling(target);
            self.fs.rename(target, &backup)?;
            Some(backup)
        } else {
            None
        };

        if let Err(err) = self.fs.rename(tmp, target) {
            if let Some(backup) = &backup {
                self.restore(backup, target);
            }
            return Err(err);
        }

        Ok(Committed {
            target: target.to_path_buf(),
            backup,
        })
    }

    /// Undo committed renames, newest first.
    fn roll_back(&self, committed: &[Committed]) {
        for done in committed.iter().rev() {
            match &done.backup {
                Some(backup) => self.restore(backup, &done.target),
                None => {
                    if let Err(err) = self.fs.remove_file(&done.target) {
                        warn!(path = ?done.target, error = %err, "failed to roll back output");
                    }
                }
            }
        }
    }

    fn restore(&self, backup: &Path, target: &Path) {
        if let Err(err) = self.fs.rename(backup, target) {
            warn!(path = ?target, error = %err, "failed to restore previous output");
        }
    }

    fn is_unchanged(&self, target: &Path, contents: &[u8]) -> bool {
        if !self.fs.is_file(target) {
            return false;
        }
        match self.fs.read(target) {
            Ok(existing) => blake3::hash(&existing) == blake3::hash(contents),
            Err(_) => false,
        }
    }

    fn discard(&self, staged: &[(PathBuf, PathBuf)]) {
        for (tmp, _) in staged {
            if let Err(err) = self.fs.remove_file(tmp) {
                warn!(path = ?tmp, error = %err, "failed to remove temporary output");
            }
        }
    }
}

fn ensure_unique_paths(
    stage: &str,
    files: &[VirtualFile],
) -> std::result::Result<(), TransformError> {
    let mut seen = HashSet::with_capacity(files.len());
    for file in files {
        if !seen.insert(&file.path) {
            return Err(TransformError::new(
                stage,
                file.path.clone(),
                anyhow!("stage produced two files with the same path"),
            ));
        }
    }
    Ok(())
}

fn ensure_relative(path: &Path) -> Result<()> {
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || path.as_os_str().is_empty() {
        return Err(TaskpipeError::Other(anyhow!(
            "output path {} must be relative to the destination",
            path.display()
        )));
    }
    Ok(())
}

/// An output moved into place, and where the file it replaced was kept.
#[derive(Debug)]
struct Committed {
    target: PathBuf,
    backup: Option<PathBuf>,
}

fn file_name(target: &Path) -> String {
    target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn temp_sibling(target: &Path) -> PathBuf {
    target.with_file_name(format!(".{}{TEMP_SUFFIX}", file_name(target)))
}

fn backup_sibling(target: &Path) -> PathBuf {
    target.with_file_name(format!(".{}.prev{TEMP_SUFFIX}", file_name(target)))
}
