// src/plugins/rename.rs

use anyhow::Result;

use crate::pipeline::{FileTransform, StageOutput, VirtualFile};

/// gulp-rename style path rewriting. A path splits into
/// `dirname / basename extname`; `basename` and `extname` replace their
/// part, `prefix` and `suffix` wrap the basename.
#[derive(Debug, Clone, Default)]
pub struct Rename {
    pub basename: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub extname: Option<String>,
}

impl Rename {
    /// `foo/style.css` with `suffix = ".min"` becomes `foo/style.min.css`.
    pub fn apply(&self, file_name: &str) -> String {
        let (stem, ext) = match file_name.rfind('.') {
            Some(idx) if idx > 0 => (&file_name[..idx], &file_name[idx..]),
            _ => (file_name, ""),
        };

        let stem = self.basename.as_deref().unwrap_or(stem);
        let ext = self.extname.as_deref().unwrap_or(ext);
        format!(
            "{}{}{}{}",
            self.prefix.as_deref().unwrap_or(""),
            stem,
            self.suffix.as_deref().unwrap_or(""),
            ext
        )
    }
}

impl FileTransform for Rename {
    fn transform(&self, mut file: VirtualFile) -> Result<StageOutput> {
        let name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        file.path.set_file_name(self.apply(&name));
        Ok(file.into())
    }
}
