// src/plugins/concat.rs

use std::path::PathBuf;

use anyhow::Result;

use crate::pipeline::{Merge, SourceMapChain, VirtualFile};

/// Joins every file of the run into `file`, in the order the executor hands
/// them over (sorted by original virtual path).
#[derive(Debug, Clone)]
pub struct Concat {
    pub file: PathBuf,
    pub separator: String,
}

impl Concat {
    pub fn new(file: impl Into<PathBuf>, separator: Option<String>) -> Self {
        Self {
            file: file.into(),
            separator: separator.unwrap_or_else(|| "\n".to_string()),
        }
    }
}

impl Merge for Concat {
    fn merge(&self, files: Vec<VirtualFile>) -> Result<VirtualFile> {
        let mut contents = Vec::new();
        let mut chain: Option<SourceMapChain> = None;

        for (idx, file) in files.into_iter().enumerate() {
            if idx > 0 {
                contents.extend_from_slice(self.separator.as_bytes());
            }
            contents.extend_from_slice(&file.contents);

            if let Some(map) = file.source_map {
                let merged = chain.get_or_insert_with(SourceMapChain::default);
                merged.sources.extend(map.sources);
            }
        }

        let mut merged = VirtualFile::new(self.file.clone(), contents);
        if let Some(mut map) = chain {
            map.stages.push("concat".to_string());
            merged.source_map = Some(map);
        }
        Ok(merged)
    }
}
