//! Streaming packaging: archiver and builder joined by a bounded channel.
//!
//! ```text
//!  archiver stdout ──pump──▶ [ byte channel, N chunks ] ──feed──▶ builder stdin
//! ```
//!
//! Both processes and both pumps run at once inside one
//! [`std::thread::scope`]. The coordinating thread joins them in a fixed
//! order:
//!
//! 1. wait for the archiver to exit,
//! 2. join the pump, which hands back the channel's write end once the
//!    archiver's stdout reaches EOF,
//! 3. close the write end (the builder now sees EOF),
//! 4. join the feeder and wait for the builder.
//!
//! The write end is therefore closed exactly once, after the archiver has
//! terminated and all of its output is in the channel, on success and on
//! failure alike. If the builder stops reading early the feeder keeps
//! draining the channel so the archiver is never blocked for good.

use std::fmt;
use std::io;
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, ExitStatus, Stdio};
use std::thread::{self, ScopedJoinHandle};

use slimpack_common::constants::{
    DEFAULT_ARCHIVER, DEFAULT_BUILDER, DEFAULT_CHANNEL_CAPACITY, DEFAULT_CHUNK_SIZE,
};
use slimpack_common::error::ProcessError;
use slimpack_common::process::ProcessSpec;
use thiserror::Error;

use crate::channel::{ByteReceiver, ByteSender, byte_channel};

/// The two sides of a packaging run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Process serializing the workspace.
    Archiver,
    /// Process consuming the archive and producing the image.
    Builder,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archiver => f.write_str("archiver"),
            Self::Builder => f.write_str("builder"),
        }
    }
}

/// Why packaging did not produce an image.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// Only the archiver exited unsuccessfully.
    #[error("archiver failed ({status})")]
    ArchiverFailed {
        /// Archiver exit status.
        status: ExitStatus,
    },

    /// Only the builder exited unsuccessfully.
    #[error("builder failed ({status})")]
    BuilderFailed {
        /// Builder exit status.
        status: ExitStatus,
    },

    /// Both exited unsuccessfully. The builder is reported first.
    #[error("builder failed ({builder}); archiver also failed ({archiver})")]
    Both {
        /// Archiver exit status.
        archiver: ExitStatus,
        /// Builder exit status.
        builder: ExitStatus,
    },

    /// A process could not be located or started.
    #[error("cannot start {role}: {source}")]
    Launch {
        /// Which process.
        role: Role,
        /// Underlying launch error.
        source: ProcessError,
    },

    /// Moving bytes to or from a process failed.
    #[error("{role} stream failed: {source}")]
    Stream {
        /// Which side of the stream.
        role: Role,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl PackagingError {
    /// The side held responsible for this failure.
    #[must_use]
    pub const fn primary_role(&self) -> Role {
        match self {
            Self::ArchiverFailed { .. } => Role::Archiver,
            Self::BuilderFailed { .. } | Self::Both { .. } => Role::Builder,
            Self::Launch { role, .. } | Self::Stream { role, .. } => *role,
        }
    }

    fn from_statuses(archiver: ExitStatus, builder: ExitStatus) -> Option<Self> {
        match (archiver.success(), builder.success()) {
            (true, true) => None,
            (false, true) => Some(Self::ArchiverFailed { status: archiver }),
            (true, false) => Some(Self::BuilderFailed { status: builder }),
            (false, false) => Some(Self::Both { archiver, builder }),
        }
    }
}

/// Outcome of one packaging run in which both processes ran to completion.
#[derive(Debug)]
pub struct PackagingResult {
    /// Archiver exit status.
    pub archiver_status: ExitStatus,
    /// Builder exit status.
    pub builder_status: ExitStatus,
    /// Bytes moved from the archiver into the channel.
    pub bytes_streamed: u64,
    /// Combined failure, `None` when both processes succeeded.
    pub failure: Option<PackagingError>,
}

impl PackagingResult {
    /// Returns `true` if both processes succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Converts a failed run into its [`PackagingError`].
    ///
    /// # Errors
    ///
    /// Returns the combined failure if either process failed.
    pub fn into_result(mut self) -> Result<Self, PackagingError> {
        match self.failure.take() {
            Some(failure) => Err(failure),
            None => Ok(self),
        }
    }
}

/// Turns a workspace directory into a container image.
pub trait Packager: Send + Sync {
    /// Packages `workspace`, tagging the image with `tag` when given.
    ///
    /// # Errors
    ///
    /// Returns an error if a process cannot be started or the stream
    /// breaks. Process exit failures are reported in
    /// [`PackagingResult::failure`].
    fn package(
        &self,
        workspace: &Path,
        tag: Option<&str>,
    ) -> Result<PackagingResult, PackagingError>;
}

/// Packager that streams `tar` output straight into an image builder.
#[derive(Debug, Clone)]
pub struct StreamingPackager {
    archiver: String,
    builder: String,
    capacity: usize,
    chunk_size: usize,
}

impl Default for StreamingPackager {
    fn default() -> Self {
        Self::new(DEFAULT_BUILDER)
    }
}

impl StreamingPackager {
    /// Creates a packager driving `builder` with default channel sizing.
    #[must_use]
    pub fn new(builder: impl Into<String>) -> Self {
        Self {
            archiver: DEFAULT_ARCHIVER.to_owned(),
            builder: builder.into(),
            capacity: DEFAULT_CHANNEL_CAPACITY,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Uses `archiver` instead of `tar`. It must accept `tar`'s arguments.
    #[must_use]
    pub fn with_archiver(mut self, archiver: impl Into<String>) -> Self {
        self.archiver = archiver.into();
        self
    }

    /// Sets the channel bound in chunks and the size of each chunk.
    #[must_use]
    pub const fn with_channel(mut self, capacity: usize, chunk_size: usize) -> Self {
        self.capacity = capacity;
        self.chunk_size = chunk_size;
        self
    }

    /// Archiver invocation: compressed archive of `workspace` on stdout.
    #[must_use]
    pub fn archiver_spec(&self, workspace: &Path) -> ProcessSpec {
        ProcessSpec::new(&self.archiver)
            .args(["-czf", "-", "."])
            .current_dir(workspace)
    }

    /// Builder invocation: build context read from stdin.
    #[must_use]
    pub fn builder_spec(&self, workspace: &Path, tag: Option<&str>) -> ProcessSpec {
        let spec = ProcessSpec::new(&self.builder).arg("build");
        let spec = match tag {
            Some(tag) => spec.args(["-t", tag]),
            None => spec,
        };
        spec.arg("-").current_dir(workspace)
    }

    /// Runs `archiver` and `builder` concurrently, streaming the archiver's
    /// stdout into the builder's stdin.
    ///
    /// # Errors
    ///
    /// Returns [`PackagingError::Launch`] if either process cannot be
    /// started and [`PackagingError::Stream`] if reading the archiver's
    /// output fails. Both processes are reaped before returning.
    pub fn run(
        &self,
        archiver: &ProcessSpec,
        builder: &ProcessSpec,
    ) -> Result<PackagingResult, PackagingError> {
        tracing::info!(command = %archiver, "starting archiver");
        let mut archiver_child = spawn(archiver, Role::Archiver, |cmd| {
            let _ = cmd.stdin(Stdio::null()).stdout(Stdio::piped());
        })?;

        tracing::info!(command = %builder, "starting builder");
        let mut builder_child = match spawn(builder, Role::Builder, |cmd| {
            let _ = cmd.stdin(Stdio::piped()).stdout(Stdio::inherit());
        }) {
            Ok(child) => child,
            Err(e) => {
                reap_after_launch_failure(&mut archiver_child);
                return Err(e);
            }
        };

        let (Some(archiver_out), Some(builder_in)) =
            (archiver_child.stdout.take(), builder_child.stdin.take())
        else {
            let _ = builder_child.kill();
            let _ = builder_child.wait();
            reap_after_launch_failure(&mut archiver_child);
            return Err(PackagingError::Stream {
                role: Role::Archiver,
                source: io::Error::other("process pipes were not created"),
            });
        };

        let (tx, rx) = byte_channel(self.capacity, self.chunk_size);
        thread::scope(|scope| {
            let pump = scope.spawn(move || pump_archiver(archiver_out, tx));
            let feeder = scope.spawn(move || feed_builder(rx, builder_in));

            let archiver_status = archiver_child.wait();
            tracing::debug!(status = ?archiver_status, "archiver exited");

            let pumped = join(pump, Role::Archiver).and_then(|(tx, copied)| {
                tx.close();
                copied.map_err(|source| PackagingError::Stream {
                    role: Role::Archiver,
                    source,
                })
            });

            let fed = join(feeder, Role::Builder);
            let builder_status = builder_child.wait();
            tracing::debug!(status = ?builder_status, "builder exited");

            let archiver_status = archiver_status.map_err(|source| PackagingError::Stream {
                role: Role::Archiver,
                source,
            })?;
            let builder_status = builder_status.map_err(|source| PackagingError::Stream {
                role: Role::Builder,
                source,
            })?;
            let bytes_streamed = pumped?;
            fed?;

            let failure = PackagingError::from_statuses(archiver_status, builder_status);
            tracing::info!(
                bytes = bytes_streamed,
                archiver = %archiver_status,
                builder = %builder_status,
                "packaging finished"
            );
            Ok(PackagingResult {
                archiver_status,
                builder_status,
                bytes_streamed,
                failure,
            })
        })
    }
}

impl Packager for StreamingPackager {
    fn package(
        &self,
        workspace: &Path,
        tag: Option<&str>,
    ) -> Result<PackagingResult, PackagingError> {
        self.run(
            &self.archiver_spec(workspace),
            &self.builder_spec(workspace, tag),
        )
    }
}

fn spawn(
    spec: &ProcessSpec,
    role: Role,
    wire: impl FnOnce(&mut std::process::Command),
) -> Result<Child, PackagingError> {
    let mut cmd = spec
        .command()
        .map_err(|source| PackagingError::Launch { role, source })?;
    wire(&mut cmd);
    cmd.spawn().map_err(|e| PackagingError::Launch {
        role,
        source: spec.spawn_error(e),
    })
}

fn reap_after_launch_failure(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Copies archiver output into the channel and hands the write end back.
///
/// The archiver's stdout is dropped on return, so an archiver still
/// writing after a read error gets `EPIPE` instead of blocking.
fn pump_archiver(
    mut archiver_out: ChildStdout,
    mut tx: ByteSender,
) -> (ByteSender, io::Result<u64>) {
    let copied = io::copy(&mut archiver_out, &mut tx);
    (tx, copied)
}

/// Copies the channel into the builder's stdin until end-of-stream.
///
/// If the builder stops reading, the rest of the stream is discarded so
/// the writer side keeps moving. The builder's exit status reports that
/// failure.
fn feed_builder(mut rx: ByteReceiver, mut builder_in: ChildStdin) {
    if let Err(e) = io::copy(&mut rx, &mut builder_in) {
        tracing::debug!(error = %e, "builder stopped reading, draining stream");
        drop(builder_in);
        let _ = io::copy(&mut rx, &mut io::sink());
    }
}

fn join<T>(handle: ScopedJoinHandle<'_, T>, role: Role) -> Result<T, PackagingError> {
    handle.join().map_err(|_| PackagingError::Stream {
        role,
        source: io::Error::other("stream thread panicked"),
    })
}
