// src/dag/mod.rs

//! Tasks and dependency scheduling.
//!
//! - [`task`] defines a task and its executable body.
//! - [`registry`] keeps named tasks in registration order.
//! - [`scheduler`] resolves prerequisites depth-first and runs each body
//!   once.

pub mod registry;
pub mod scheduler;
pub mod task;

pub use registry::TaskRegistry;
pub use scheduler::{RunSummary, Scheduler};
pub use task::{Task, TaskBody};
