//! # slimpack-image
//!
//! Turns a validated config into a container image.
//!
//! Handles:
//! - **Manifest**: deterministic rendering of the container-build manifest
//!   from a [`slimpack_config::Config`] and an explicit environment snapshot.
//! - **Channel**: a bounded in-memory byte stream with one writer and one
//!   reader.
//! - **Packager**: runs the archiver and the image builder concurrently,
//!   joined by the byte channel.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod channel;
pub mod manifest;
pub mod packager;

pub use manifest::{EnvironmentSnapshot, Manifest, RenderError, TemplateError, render};
pub use packager::{Packager, PackagingError, PackagingResult, Role, StreamingPackager};
