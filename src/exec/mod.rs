// src/exec/mod.rs

//! Run execution for the watch runtime.
//!
//! - [`backend`] provides the `RunBackend` trait and the production
//!   `SchedulerBackend`, which tests replace with a fake implementation.

pub mod backend;

pub use backend::{RunBackend, SchedulerBackend};
