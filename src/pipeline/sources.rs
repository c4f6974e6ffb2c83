// src/pipeline/sources.rs

//! Resolve `src` globs into the fixed input file set of a pipeline run.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;
use crate::pipeline::file::{VirtualFile, path_to_slash};

/// Compiled `src` patterns.
///
/// Positive patterns select files; `!`-prefixed patterns exclude them. Each
/// positive pattern has a base directory (its leading non-glob components);
/// a matched file's virtual path is its path relative to that base, so
/// `assets/scss/*.scss` turns `assets/scss/style.scss` into `style.scss`.
#[derive(Debug, Clone)]
pub struct SourceGlobs {
    include: Vec<(GlobMatcher, PathBuf)>,
    exclude: GlobSet,
}

impl SourceGlobs {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut include = Vec::new();
        let mut exclude = GlobSetBuilder::new();

        for raw in patterns {
            let (negated, pat) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw.as_str()),
            };
            let pat = normalize_pattern(pat);
            let glob = GlobBuilder::new(&pat)
                .literal_separator(true)
                .build()
                .with_context(|| format!("invalid glob pattern: {raw}"))?;

            if negated {
                exclude.add(glob);
            } else {
                include.push((glob.compile_matcher(), glob_base(&pat)));
            }
        }

        if include.is_empty() {
            anyhow::bail!("no positive `src` pattern in {:?}", patterns);
        }

        Ok(Self {
            include,
            exclude: exclude.build()?,
        })
    }

    /// Virtual path for a root-relative path, or `None` if not selected.
    pub fn virtual_path(&self, rel: &str) -> Option<PathBuf> {
        if self.exclude.is_match(rel) {
            return None;
        }
        self.include
            .iter()
            .find(|(matcher, _)| matcher.is_match(rel))
            .map(|(_, base)| {
                Path::new(rel)
                    .strip_prefix(base)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| PathBuf::from(rel))
            })
    }

    /// Read every selected file below `root`, sorted by root-relative path so
    /// the result never depends on directory listing order. Two sources that
    /// end up with the same virtual path are an error.
    pub fn collect(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<VirtualFile>> {
        let bases: BTreeSet<&PathBuf> = self.include.iter().map(|(_, base)| base).collect();
        let mut seen = BTreeSet::new();

        for base in bases {
            let start = root.join(base);
            if !fs.is_dir(&start) {
                continue;
            }
            let mut stack = vec![start];
            while let Some(dir) = stack.pop() {
                for path in fs.read_dir(&dir)? {
                    if fs.is_dir(&path) {
                        stack.push(path);
                    } else if let Ok(rel) = path.strip_prefix(root) {
                        seen.insert(path_to_slash(rel));
                    }
                }
            }
        }

        let mut files = Vec::new();
        let mut claimed: BTreeMap<PathBuf, String> = BTreeMap::new();
        for rel in seen {
            if let Some(virtual_path) = self.virtual_path(&rel) {
                if let Some(other) = claimed.insert(virtual_path.clone(), rel.clone()) {
                    anyhow::bail!(
                        "sources {other} and {rel} both map to {}",
                        path_to_slash(&virtual_path)
                    );
                }
                let real = root.join(&rel);
                let contents = fs.read(&real)?;
                files.push(VirtualFile::new(virtual_path, contents).with_source(real));
            }
        }

        Ok(files)
    }
}

fn normalize_pattern(pat: &str) -> String {
    let mut pat = pat.replace('\\', "/");
    while let Some(rest) = pat.strip_prefix("./") {
        pat = rest.to_string();
    }
    pat
}

/// Leading path components of a pattern that contain no glob syntax.
fn glob_base(pat: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let mut components: Vec<&str> = pat.split('/').collect();
    // The last component names files, never a directory to strip.
    components.pop();
    for comp in components {
        if comp.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(comp);
    }
    base
}
