// src/plugins/filter.rs

use anyhow::Result;
use regex::Regex;

use crate::pipeline::file::path_to_slash;
use crate::pipeline::{FileTransform, StageOutput, VirtualFile};

/// Drops files whose virtual path matches a regex, e.g. `(^|/)_` for Sass
/// partials.
#[derive(Debug, Clone)]
pub struct Filter {
    exclude: Regex,
}

impl Filter {
    pub fn new(exclude: &str) -> Result<Self> {
        Ok(Self {
            exclude: Regex::new(exclude)?,
        })
    }
}

impl FileTransform for Filter {
    fn transform(&self, file: VirtualFile) -> Result<StageOutput> {
        if self.exclude.is_match(&path_to_slash(&file.path)) {
            Ok(StageOutput::Drop)
        } else {
            Ok(file.into())
        }
    }
}
