// src/watch/path_utils.rs

use std::path::{Path, PathBuf};

use crate::pipeline::file::path_to_slash;

/// `path` relative to `root`, with forward slashes, or `None` if it lies
/// outside `root`.
///
/// Notification paths may use a different absolute prefix than the root
/// (symlinked temp dirs on macOS), so a failed `strip_prefix` is retried
/// on canonical paths. A deleted file can't be canonicalized; its parent
/// directory is used instead.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(path_to_slash(rel));
    }

    let root = root.canonicalize().ok()?;
    let path = canonicalize_lenient(path)?;
    path.strip_prefix(&root).ok().map(path_to_slash)
}

fn canonicalize_lenient(path: &Path) -> Option<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Some(canonical);
    }
    let parent = path.parent()?.canonicalize().ok()?;
    Some(parent.join(path.file_name()?))
}
