// src/plugins/sourcemaps.rs

use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;

use crate::pipeline::{FileTransform, SourceMapChain, StageOutput, VirtualFile};

/// Start a source-map chain for every file that doesn't carry one yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourcemapInit;

impl FileTransform for SourcemapInit {
    fn transform(&self, mut file: VirtualFile) -> Result<StageOutput> {
        if file.source_map.is_none() {
            file.source_map = Some(SourceMapChain::start(&file.original));
        }
        Ok(file.into())
    }
}

/// Split every tracked file into the file itself (with a
/// `sourceMappingURL` comment appended) and a version 3 `.map` file.
///
/// Maps list the contributing sources and the stages applied; position
/// mappings are left empty.
#[derive(Debug, Clone, Default)]
pub struct SourcemapWrite {
    /// Directory for map files, relative to each file's directory.
    pub dir: Option<PathBuf>,
}

impl FileTransform for SourcemapWrite {
    fn transform(&self, mut file: VirtualFile) -> Result<StageOutput> {
        let Some(chain) = file.source_map.take() else {
            return Ok(file.into());
        };

        let file_name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let map_rel = match &self.dir {
            Some(dir) => dir.join(format!("{file_name}.map")),
            None => PathBuf::from(format!("{file_name}.map")),
        };
        let map_url = map_rel.to_string_lossy().replace('\\', "/");

        let map = json!({
            "version": 3,
            "file": file_name,
            "sources": chain.sources,
            "names": [],
            "mappings": "",
            "x_taskpipe_stages": chain.stages,
        });
        let map_path = match file.path.parent() {
            Some(parent) => parent.join(&map_rel),
            None => map_rel.clone(),
        };
        let map_file = VirtualFile::new(map_path, serde_json::to_vec_pretty(&map)?);

        let is_css = file
            .path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("css"));
        let comment = if is_css {
            format!("\n/*# sourceMappingURL={map_url} */\n")
        } else {
            format!("\n//# sourceMappingURL={map_url}\n")
        };
        file.contents.extend_from_slice(comment.as_bytes());

        Ok(StageOutput::Many(vec![file, map_file]))
    }
}
