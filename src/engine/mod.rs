// src/engine/mod.rs

//! Watch orchestration.
//!
//! - [`core`] holds the [`WatchCoordinator`], a synchronous state machine
//!   fed with change events and explicit timestamps.
//! - [`queue`] holds the depth-1 rerun queue for tasks that are triggered
//!   while already running.
//! - [`runtime`] is the async shell: it reads [`RuntimeEvent`]s, sleeps
//!   until the next debounce deadline and dispatches due tasks to a
//!   [`crate::exec::RunBackend`].

use crate::types::{ChangeEvent, TaskName};

/// How a dispatched run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// Rendered error of the failed run.
    Failed(String),
}

/// Events flowing into the runtime from the watcher, the backend and the
/// signal handler.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A file below the project root changed.
    FileChanged(ChangeEvent),
    /// A dispatched run finished.
    RunCompleted { task: TaskName, outcome: RunOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod queue;
pub mod runtime;

pub use self::core::{SubscriptionState, WatchCoordinator};
pub use queue::RerunQueue;
pub use runtime::Runtime;
