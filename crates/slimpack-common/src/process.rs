//! Description of an external process invocation.
//!
//! The compiler, archiver, and builder are all driven through a
//! [`ProcessSpec`], which keeps the exact command line available for
//! logging and error reporting.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ProcessError;

/// Program, arguments, working directory, and environment overrides for
/// one external process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Program name or path.
    pub program: String,
    /// Arguments passed after the program name.
    pub args: Vec<String>,
    /// Working directory, inherited when `None`.
    pub current_dir: Option<PathBuf>,
    /// Variables set on top of the inherited environment.
    pub env: BTreeMap<String, String>,
}

impl ProcessSpec {
    /// Creates a spec for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Adds an environment override.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.env.insert(key.into(), value.into());
        self
    }

    /// Locates the program on `PATH` (or checks an explicit path).
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::NotFound`] if no executable matches.
    pub fn resolve_program(&self) -> Result<PathBuf, ProcessError> {
        which::which(&self.program).map_err(|source| ProcessError::NotFound {
            program: self.program.clone(),
            source,
        })
    }

    /// Builds a [`Command`] for this spec. Stdio is left for the caller to wire.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::NotFound`] if the program cannot be located.
    pub fn command(&self) -> Result<Command, ProcessError> {
        let program = self.resolve_program()?;
        let mut cmd = Command::new(program);
        let _ = cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            let _ = cmd.current_dir(dir);
        }
        let _ = cmd.envs(&self.env);
        Ok(cmd)
    }

    /// Wraps a spawn failure with this spec's command line.
    #[must_use]
    pub fn spawn_error(&self, source: std::io::Error) -> ProcessError {
        ProcessError::Spawn {
            command: self.to_string(),
            source,
        }
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
