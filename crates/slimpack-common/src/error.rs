//! Errors raised while launching external processes.
//!
//! Each higher-level crate defines its own domain-specific error enum that
//! wraps [`ProcessError`] where it launches a collaborator.

use thiserror::Error;

/// Failure to locate or start an external program.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be found on `PATH` or is not executable.
    #[error("program `{program}` not found: {source}")]
    NotFound {
        /// Program as it was requested.
        program: String,
        /// Underlying lookup error.
        source: which::Error,
    },

    /// The operating system refused to start the program.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// Full command line that was attempted.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
