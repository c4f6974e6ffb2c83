// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - Compiling `watch` / `exclude` glob patterns per task into
//!   [`WatchSubscription`]s.
//! - Wiring up a cross-platform filesystem watcher (`notify`) that turns raw
//!   notifications into root-relative [`crate::types::ChangeEvent`]s.
//!
//! It does not debounce or decide what runs; that is the coordinator's job.

pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use patterns::{WatchSubscription, build_subscriptions};
pub use watcher::{WatcherHandle, spawn_watcher};
