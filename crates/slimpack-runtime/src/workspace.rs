//! Build workspace lifecycle.
//!
//! A temporary workspace is removed when the [`Workspace`] is dropped,
//! whether the run succeeded or failed, unless retention was requested.
//! A directory supplied by the caller is never removed.

use std::path::{Path, PathBuf};

use slimpack_common::constants::WORKSPACE_PREFIX;
use tempfile::TempDir;
use thiserror::Error;

/// Why the workspace could not be prepared.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// A temporary directory could not be created.
    #[error("cannot create temporary workspace: {0}")]
    Temp(#[source] std::io::Error),

    /// The requested directory could not be created.
    #[error("cannot create workspace {path}: {source}")]
    Create {
        /// Requested directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Directory holding the artifact, the manifest, and nothing else.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    temp: Option<TempDir>,
    retain: bool,
}

impl Workspace {
    /// Prepares a workspace.
    ///
    /// With `explicit` set, that directory is created if needed and kept
    /// after the run. Otherwise a fresh temporary directory is used and
    /// removed on drop unless `retain` is set.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkspaceError`] if the directory cannot be created.
    pub fn create(explicit: Option<&Path>, retain: bool) -> Result<Self, WorkspaceError> {
        let workspace = match explicit {
            Some(path) => {
                std::fs::create_dir_all(path).map_err(|source| WorkspaceError::Create {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self {
                    path: path.to_path_buf(),
                    temp: None,
                    retain: true,
                }
            }
            None => {
                let temp = tempfile::Builder::new()
                    .prefix(WORKSPACE_PREFIX)
                    .tempdir()
                    .map_err(WorkspaceError::Temp)?;
                Self {
                    path: temp.path().to_path_buf(),
                    temp: Some(temp),
                    retain,
                }
            }
        };
        tracing::info!(
            path = %workspace.path.display(),
            retained = workspace.retain,
            "workspace ready"
        );
        Ok(workspace)
    }

    /// Workspace directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory outlives this value.
    #[must_use]
    pub const fn is_retained(&self) -> bool {
        self.retain
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let Some(temp) = self.temp.take() else {
            return;
        };
        if self.retain {
            let path = temp.keep();
            tracing::info!(path = %path.display(), "workspace kept");
        } else if let Err(e) = temp.close() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove workspace");
        } else {
            tracing::debug!(path = %self.path.display(), "workspace removed");
        }
    }
}
