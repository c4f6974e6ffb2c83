// src/pipeline/file.rs

//! File records flowing through a pipeline.

use std::path::{Path, PathBuf};

/// Where a file came from and what has been done to it, for source maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMapChain {
    /// Original virtual paths contributing to this file, in merge order.
    pub sources: Vec<String>,
    /// Names of the stages applied since the chain was started.
    pub stages: Vec<String>,
}

impl SourceMapChain {
    pub fn start(source: &Path) -> Self {
        Self {
            sources: vec![path_to_slash(source)],
            stages: Vec::new(),
        }
    }
}

/// A file inside a pipeline run.
///
/// `path` is the virtual path relative to the run's destination directory;
/// stages may change it. `original` is the virtual path the file had when it
/// was read and is the sort key for merges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
    pub path: PathBuf,
    pub original: PathBuf,
    /// Real location of the source file, when it came from disk.
    pub source: Option<PathBuf>,
    pub contents: Vec<u8>,
    pub source_map: Option<SourceMapChain>,
}

impl VirtualFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        Self {
            original: path.clone(),
            path,
            source: None,
            contents: contents.into(),
            source_map: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Contents as UTF-8, or an error naming the file.
    pub fn text(&self) -> anyhow::Result<&str> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| anyhow::anyhow!("{} is not valid UTF-8: {e}", self.path.display()))
    }

    /// Replace contents, keeping path and metadata.
    pub fn with_contents(mut self, contents: impl Into<Vec<u8>>) -> Self {
        self.contents = contents.into();
        self
    }

    /// Record a stage in the source-map chain, if one is being tracked.
    pub fn record_stage(&mut self, stage: &str) {
        if let Some(chain) = self.source_map.as_mut() {
            chain.stages.push(stage.to_string());
        }
    }
}

/// Render a path with forward slashes, the form used in globs and maps.
pub fn path_to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
