// src/plugins/exec.rs

//! Stages that delegate to an external program: contents go to its stdin,
//! its stdout replaces the contents.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow, bail};

use crate::pipeline::file::path_to_slash;
use crate::pipeline::{FileTransform, StageOutput, VirtualFile};

#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
    /// Only files with one of these extensions are piped; others pass
    /// through. Empty means every file.
    extensions: Vec<String>,
}

impl ExternalCommand {
    /// `cmd` may carry leading arguments (`"esbuild --minify"`); `args` are
    /// appended after them.
    pub fn new(cmd: &str, args: &[String]) -> Result<Self> {
        let mut parts = cmd.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| anyhow!("empty command"))?;
        let mut all_args: Vec<String> = parts.collect();
        all_args.extend(args.iter().cloned());
        Ok(Self {
            program,
            args: all_args,
            extensions: Vec::new(),
        })
    }

    /// A JavaScript minifier: only `.js` files are piped through it.
    pub fn js_minifier(cmd: &str, args: &[String]) -> Result<Self> {
        let mut command = Self::new(cmd, args)?;
        command.extensions = vec!["js".to_string()];
        Ok(command)
    }

    fn applies_to(&self, file: &VirtualFile) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        file.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.iter().any(|x| x == e))
    }

    fn run(&self, file: &VirtualFile) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("TASKPIPE_FILE", path_to_slash(&file.path))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning `{}`", self.program))?;

        let mut stdin = child.stdin.take().context("child stdin unavailable")?;
        let input = file.contents.clone();
        // Feed stdin from another thread so a chatty child can't deadlock us.
        let writer = std::thread::spawn(move || stdin.write_all(&input));

        let output = child
            .wait_with_output()
            .with_context(|| format!("waiting for `{}`", self.program))?;
        let written = writer
            .join()
            .map_err(|_| anyhow!("stdin writer thread panicked"))?;

        if !output.status.success() {
            bail!(
                "`{}` exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        written.with_context(|| format!("writing to `{}` stdin", self.program))?;

        Ok(output.stdout)
    }
}

impl FileTransform for ExternalCommand {
    fn transform(&self, file: VirtualFile) -> Result<StageOutput> {
        if !self.applies_to(&file) {
            return Ok(file.into());
        }
        let out = self.run(&file)?;
        Ok(file.with_contents(out).into())
    }
}
