// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `taskpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskpipe",
    version,
    about = "Run file pipelines declared as named tasks, once or on file changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Patterns and destinations are resolved relative to its directory.
    #[arg(long, global = true, value_name = "PATH", default_value = "Taskpipe.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKPIPE_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a task after its prerequisites.
    Run {
        /// Name of the task to run.
        task: String,

        /// Print the resolved execution order and stages without running.
        #[arg(long)]
        dry_run: bool,
    },

    /// Watch the project and re-run tasks when their files change.
    Watch {
        /// Run every watched task once before waiting for changes.
        #[arg(long)]
        initial: bool,
    },

    /// List the configured tasks.
    List,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
