//! Build orchestration for slimpack.
//!
//! [`pipeline::Pipeline`] drives a run through its stages in strict order:
//! resolve the package, validate its config, prepare a workspace, compile,
//! render the manifest, and (unless dry-running) package the image. Each
//! stage fails with its own termination status, see [`error::Stage`].

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod compile;
pub mod error;
pub mod pipeline;
pub mod resolve;
pub mod workspace;

pub use compile::{CompileError, Compiler, GoCompiler};
pub use error::{EXIT_FAILURE, EXIT_USAGE, PipelineError, Stage};
pub use pipeline::{Pipeline, PipelineOptions, PipelineReport};
pub use resolve::{Package, ResolutionError, resolve_package};
pub use workspace::{Workspace, WorkspaceError};
