//! Compiler collaborator.
//!
//! The target platform is passed to the compiler as explicit environment
//! overrides on its own process. The host environment is left untouched.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use slimpack_common::constants::{DEFAULT_COMPILER, TARGET_ARCH, TARGET_OS};
use slimpack_common::error::ProcessError;
use slimpack_common::process::ProcessSpec;
use thiserror::Error;

use crate::resolve::Package;

/// Why the artifact could not be produced.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler could not be started.
    #[error(transparent)]
    Launch(#[from] ProcessError),

    /// The compiler exited unsuccessfully.
    #[error("`{command}` exited with {status}:\n{output}")]
    Failed {
        /// Full command line.
        command: String,
        /// Exit status.
        status: ExitStatus,
        /// Combined stdout and stderr.
        output: String,
    },

    /// The compiler succeeded but left no artifact behind.
    #[error("compiler reported success but produced no artifact at {0}")]
    MissingArtifact(PathBuf),
}

/// Produces a static artifact from a package.
pub trait Compiler: Send + Sync {
    /// Compiles `package` into the file at `output`.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] if compilation fails.
    fn compile(&self, package: &Package, output: &Path) -> Result<(), CompileError>;
}

/// Go toolchain cross-compiling a static linux/amd64 binary.
#[derive(Debug, Clone)]
pub struct GoCompiler {
    program: String,
}

impl Default for GoCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_COMPILER)
    }
}

impl GoCompiler {
    /// Creates a compiler driving `program` (normally `go`).
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Compiler invocation for `package`, run from the package directory.
    #[must_use]
    pub fn spec(&self, package: &Package, output: &Path) -> ProcessSpec {
        ProcessSpec::new(&self.program)
            .args(["build", "-o"])
            .arg(output.to_string_lossy())
            .arg(".")
            .current_dir(&package.dir)
            .env("GOOS", TARGET_OS)
            .env("GOARCH", TARGET_ARCH)
            .env("CGO_ENABLED", "0")
    }
}

impl Compiler for GoCompiler {
    fn compile(&self, package: &Package, output: &Path) -> Result<(), CompileError> {
        let spec = self.spec(package, output);
        tracing::info!(package = %package.name, command = %spec, "compiling");

        let result = spec
            .command()?
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spec.spawn_error(e))?;

        if !result.status.success() {
            let mut combined = String::from_utf8_lossy(&result.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&result.stderr));
            return Err(CompileError::Failed {
                command: spec.to_string(),
                status: result.status,
                output: combined,
            });
        }
        if !output.is_file() {
            return Err(CompileError::MissingArtifact(output.to_path_buf()));
        }

        tracing::info!(package = %package.name, "build successful");
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    /// Writes an executable stand-in for `go` that runs `body`.
    fn fake_go(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-go");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("chmod");
        path
    }

    fn package(dir: &Path) -> Package {
        Package {
            dir: dir.to_path_buf(),
            name: "example.com/hello".into(),
        }
    }

    #[test]
    fn spec_cross_compiles_from_package_dir() {
        let compiler = GoCompiler::default();
        let spec = compiler.spec(&package(Path::new("/src/hello")), Path::new("/ws/server_linux64"));
        assert_eq!(spec.to_string(), "go build -o /ws/server_linux64 .");
        assert_eq!(spec.current_dir.as_deref(), Some(Path::new("/src/hello")));
        assert_eq!(spec.env.get("GOOS").map(String::as_str), Some("linux"));
        assert_eq!(spec.env.get("GOARCH").map(String::as_str), Some("amd64"));
        assert_eq!(spec.env.get("CGO_ENABLED").map(String::as_str), Some("0"));
    }

    #[test]
    fn compile_writes_artifact_with_target_env() {
        let tools = tempfile::tempdir().expect("tools");
        let out = tempfile::tempdir().expect("out");
        let go = fake_go(
            tools.path(),
            r#"[ "$GOOS" = linux ] && [ "$GOARCH" = amd64 ] || exit 9
printf binary > "$3""#,
        );
        let artifact = out.path().join("server_linux64");

        GoCompiler::new(go.to_string_lossy())
            .compile(&package(tools.path()), &artifact)
            .expect("compile should succeed");
        assert_eq!(std::fs::read(&artifact).expect("artifact"), b"binary");
    }

    #[test]
    fn compile_failure_captures_combined_output() {
        let tools = tempfile::tempdir().expect("tools");
        let go = fake_go(tools.path(), "echo 'building'; echo 'main.go:3: syntax error' >&2; exit 2");

        let err = GoCompiler::new(go.to_string_lossy())
            .compile(&package(tools.path()), &tools.path().join("out"))
            .unwrap_err();
        match err {
            CompileError::Failed { status, output, .. } => {
                assert_eq!(status.code(), Some(2));
                assert!(output.contains("building"), "got: {output}");
                assert!(output.contains("syntax error"), "got: {output}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn compile_without_artifact_fails() {
        let tools = tempfile::tempdir().expect("tools");
        let go = fake_go(tools.path(), "exit 0");
        let err = GoCompiler::new(go.to_string_lossy())
            .compile(&package(tools.path()), &tools.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, CompileError::MissingArtifact(_)), "got: {err}");
    }

    #[test]
    fn compile_with_missing_toolchain_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = GoCompiler::new("slimpack-missing-go")
            .compile(&package(dir.path()), &dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, CompileError::Launch(_)), "got: {err}");
    }
}
