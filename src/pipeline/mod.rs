// src/pipeline/mod.rs

//! File pipelines.
//!
//! - [`file`] defines the `VirtualFile` records that flow through a run.
//! - [`stage`] defines stage descriptors and the plugin traits.
//! - [`sources`] turns `src` globs into the fixed input file set.
//! - [`executor`] applies stages with a barrier between them and writes
//!   the outputs atomically.

pub mod executor;
pub mod file;
pub mod sources;
pub mod stage;

pub use executor::{PipelineExecutor, PipelineRun, WriteReport};
pub use file::{SourceMapChain, VirtualFile};
pub use sources::SourceGlobs;
pub use stage::{FileTransform, Merge, Stage, StageKind, StageOutput};
