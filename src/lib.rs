// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod plugins;
pub mod project;
pub mod types;
pub mod watch;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, load_and_validate, project_root};
use crate::dag::{RunSummary, Scheduler};
use crate::engine::{Runtime, RuntimeEvent, WatchCoordinator};
use crate::errors::{Result, TaskpipeError};
use crate::exec::SchedulerBackend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::project::build_scheduler;
use crate::types::TaskName;
use crate::watch::{build_subscriptions, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, then dispatches to `run`, `watch` or
/// `list`.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let root = project_root(&config_path);
    debug!(config = ?config_path, root = ?root, "loaded config");

    match args.command {
        Command::List => {
            print_task_list(&cfg);
            Ok(())
        }
        Command::Run { task, dry_run } => {
            let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
            let scheduler = build_scheduler(&cfg, &root, fs)?;
            if dry_run {
                print_dry_run(&cfg, &scheduler, &task)
            } else {
                run_task(scheduler, task).await.map(|_| ())
            }
        }
        Command::Watch { initial } => watch(&cfg, &root, initial).await,
    }
}

/// Run `task` once, off the async executor.
pub async fn run_task(scheduler: Scheduler, task: TaskName) -> Result<RunSummary> {
    let summary = tokio::task::spawn_blocking(move || scheduler.execute(&task))
        .await
        .map_err(|e| anyhow!("run aborted: {e}"))??;
    info!(executed = ?summary.executed, "all tasks finished");
    Ok(summary)
}

/// Watch the project until Ctrl-C.
async fn watch(cfg: &ConfigFile, root: &Path, initial: bool) -> Result<()> {
    let subscriptions = build_subscriptions(cfg)?;
    if subscriptions.is_empty() {
        return Err(TaskpipeError::WatchSubscription(
            "no task has `watch` patterns (set them per task or in [default])".to_string(),
        ));
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let scheduler = Arc::new(build_scheduler(cfg, root, fs)?);

    let mut closures = HashMap::new();
    for subscription in subscriptions.iter() {
        let task = subscription.task();
        closures.insert(task.to_string(), scheduler.resolve(task)?);
    }

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let backend = SchedulerBackend::new(scheduler, rt_tx.clone());
    let watcher = spawn_watcher(root, rt_tx.clone())?;

    // Ctrl-C -> graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }
    drop(rt_tx);

    let core = WatchCoordinator::new(subscriptions).with_closures(closures);
    let initial_runs: Vec<TaskName> = if initial {
        core.tasks().map(str::to_string).collect()
    } else {
        Vec::new()
    };
    info!(tasks = ?core.tasks().collect::<Vec<_>>(), "watching");

    Runtime::new(core, rt_rx, backend)
        .with_watcher(watcher)
        .with_initial_runs(initial_runs)
        .run()
        .await
}

/// Print every task with its prerequisites, sources and stages.
fn print_task_list(cfg: &ConfigFile) {
    println!("tasks ({}):", cfg.tasks().len());
    for (name, task) in cfg.tasks() {
        println!("  - {name}");
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if !task.src.is_empty() {
            println!("      src: {:?}", task.src);
        }
        if let Some(ref dest) = task.dest {
            println!("      dest: {dest}");
        }
        let stages: Vec<&str> = task
            .effective_stages()
            .into_iter()
            .map(|s| s.kind_name())
            .collect();
        if !stages.is_empty() {
            println!("      stages: {}", stages.join(" -> "));
        }
        if let Some(ref watch) = task.watch {
            if !watch.is_empty() {
                println!("      watch: {:?}", watch);
            }
        }
    }
}

/// Print the execution order for `task` without running anything.
fn print_dry_run(cfg: &ConfigFile, scheduler: &Scheduler, task: &str) -> Result<()> {
    let order = scheduler.resolve(task)?;

    println!("taskpipe dry-run: {task}");
    println!("  config.debounce_ms = {}", cfg.settings().debounce_ms);
    println!();
    for (idx, name) in order.iter().enumerate() {
        println!("  {}. {name}", idx + 1);
        let Some(tc) = cfg.task(name) else {
            continue;
        };
        if let Some(ref dest) = tc.dest {
            println!("      {:?} -> {dest}", tc.src);
        }
        for stage in tc.effective_stages() {
            println!("      | {}", stage.kind_name());
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
