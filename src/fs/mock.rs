// src/fs/mock.rs

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};

use super::FileSystem;

/// In-memory filesystem. Directories are implied by the files below them;
/// `.` components are ignored so `./a/b` and `a/b` name the same file.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    failing_writes: HashSet<PathBuf>,
    failing_renames: HashSet<PathBuf>,
    writes: Vec<PathBuf>,
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panic while holding the lock only happens inside tests; keep going.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.state()
            .files
            .insert(normalize(path.as_ref()), content.into());
    }

    /// Contents of a file, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state().files.get(&normalize(path.as_ref())).cloned()
    }

    /// All file paths currently stored, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.state().files.keys().cloned().collect()
    }

    /// Make every later `write` to `path` fail.
    pub fn fail_writes_to(&self, path: impl AsRef<Path>) {
        self.state().failing_writes.insert(normalize(path.as_ref()));
    }

    /// Make every later `rename` onto `path` fail, leaving both sides as
    /// they were.
    pub fn fail_renames_to(&self, path: impl AsRef<Path>) {
        self.state().failing_renames.insert(normalize(path.as_ref()));
    }

    /// Paths passed to `write`, in call order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.state().writes.clone()
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.state()
            .files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let path = normalize(path);
        let mut state = self.state();
        if state.failing_writes.contains(&path) {
            return Err(anyhow!("simulated write failure: {:?}", path));
        }
        state.writes.push(path.clone());
        state.files.insert(path, contents.to_vec());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let to = normalize(to);
        let mut state = self.state();
        if state.failing_renames.contains(&to) {
            return Err(anyhow!("simulated rename failure: {:?}", to));
        }
        let data = state
            .files
            .remove(&normalize(from))
            .ok_or_else(|| anyhow!("File not found: {:?}", from))?;
        state.files.insert(to, data);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.state()
            .files
            .remove(&normalize(path))
            .map(|_| ())
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.state().files.contains_key(&normalize(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let dir = normalize(path);
        self.state()
            .files
            .keys()
            .any(|p| p != &dir && p.starts_with(&dir))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let dir = normalize(path);
        let state = self.state();
        let mut children = BTreeSet::new();
        for file in state.files.keys() {
            if file == &dir {
                continue;
            }
            if let Ok(rest) = file.strip_prefix(&dir) {
                if let Some(first) = rest.components().next() {
                    children.insert(dir.join(first.as_os_str()));
                }
            }
        }
        if children.is_empty() && !dir.as_os_str().is_empty() {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }
        Ok(children.into_iter().collect())
    }
}
