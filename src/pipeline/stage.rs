// src/pipeline/stage.rs

//! Stage descriptors and the plugin traits stages implement.

use std::fmt;

use crate::pipeline::file::VirtualFile;

/// Result of transforming one file.
#[derive(Debug)]
pub enum StageOutput {
    /// The file is removed from the run.
    Drop,
    One(VirtualFile),
    /// The file is split into several (e.g. a file and its source map).
    Many(Vec<VirtualFile>),
}

impl From<VirtualFile> for StageOutput {
    fn from(file: VirtualFile) -> Self {
        StageOutput::One(file)
    }
}

impl StageOutput {
    pub(crate) fn into_files(self) -> Vec<VirtualFile> {
        match self {
            StageOutput::Drop => Vec::new(),
            StageOutput::One(file) => vec![file],
            StageOutput::Many(files) => files,
        }
    }
}

/// A stage applied to each file independently. Files of one stage may be
/// processed in parallel.
pub trait FileTransform: Send + Sync {
    fn transform(&self, file: VirtualFile) -> anyhow::Result<StageOutput>;
}

impl<F> FileTransform for F
where
    F: Fn(VirtualFile) -> anyhow::Result<StageOutput> + Send + Sync,
{
    fn transform(&self, file: VirtualFile) -> anyhow::Result<StageOutput> {
        self(file)
    }
}

/// A stage that folds the whole file set into one file. Inputs arrive sorted
/// by original virtual path.
pub trait Merge: Send + Sync {
    fn merge(&self, files: Vec<VirtualFile>) -> anyhow::Result<VirtualFile>;
}

impl<F> Merge for F
where
    F: Fn(Vec<VirtualFile>) -> anyhow::Result<VirtualFile> + Send + Sync,
{
    fn merge(&self, files: Vec<VirtualFile>) -> anyhow::Result<VirtualFile> {
        self(files)
    }
}

pub enum StageKind {
    Transform(Box<dyn FileTransform>),
    Merge(Box<dyn Merge>),
    /// Snapshot the current files as outputs of the run.
    Emit,
}

/// One named step of a pipeline.
pub struct Stage {
    name: String,
    kind: StageKind,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            StageKind::Transform(_) => "transform",
            StageKind::Merge(_) => "merge",
            StageKind::Emit => "emit",
        };
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

impl Stage {
    pub fn transform(name: impl Into<String>, transform: impl FileTransform + 'static) -> Self {
        Self {
            name: name.into(),
            kind: StageKind::Transform(Box::new(transform)),
        }
    }

    pub fn merge(name: impl Into<String>, merge: impl Merge + 'static) -> Self {
        Self {
            name: name.into(),
            kind: StageKind::Merge(Box::new(merge)),
        }
    }

    pub fn emit() -> Self {
        Self {
            name: "emit".to_string(),
            kind: StageKind::Emit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &StageKind {
        &self.kind
    }
}
