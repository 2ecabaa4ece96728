//! # slimpack-common
//!
//! Shared constants and process invocation descriptions used across the
//! slimpack workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod constants;
pub mod error;
pub mod process;
