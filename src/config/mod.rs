// src/config/mod.rs

//! Configuration loading and validation for taskpipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate dependencies, cycles and stage options (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str, project_root};
pub use model::{
    ConfigFile, ConfigSection, DefaultSection, RawConfigFile, SassStyle, StageConfig, TaskConfig,
};
