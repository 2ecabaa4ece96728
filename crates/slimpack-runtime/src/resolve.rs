//! Package directory resolution.
//!
//! A package is named by the `module` path of the nearest enclosing
//! `go.mod` (plus the relative subdirectory), or failing that by its path
//! relative to `$GOPATH/src`.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// A resolved package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Canonical absolute directory.
    pub dir: PathBuf,
    /// Import path of the package.
    pub name: String,
}

/// Why a directory could not be resolved to a package.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The directory does not exist or cannot be canonicalized.
    #[error("cannot resolve {path}: {source}")]
    Canonicalize {
        /// Directory as given.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The path exists but is not a directory.
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    /// A `go.mod` file exists but cannot be read.
    #[error("failed to read {path}: {source}")]
    ReadModule {
        /// Path of the `go.mod` file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A `go.mod` file without a `module` line.
    #[error("{0} has no module declaration")]
    MissingModule(PathBuf),

    /// No `go.mod` was found and `GOPATH` is unset.
    #[error("{0} is not inside a module and no GOPATH is set")]
    NoGopath(PathBuf),

    /// No `go.mod` was found and the directory is outside every GOPATH.
    #[error("{dir} is not inside a module or any GOPATH src directory ({gopath})")]
    OutsideGopath {
        /// Canonical package directory.
        dir: PathBuf,
        /// `GOPATH` as configured.
        gopath: String,
    },
}

/// Resolves `dir` to a package.
///
/// `gopath` is the value of `GOPATH`, which may list several directories.
///
/// # Errors
///
/// Returns a [`ResolutionError`] if the directory is missing or the
/// package name cannot be determined.
pub fn resolve_package(dir: &Path, gopath: Option<&OsStr>) -> Result<Package, ResolutionError> {
    let canonical = dir
        .canonicalize()
        .map_err(|source| ResolutionError::Canonicalize {
            path: dir.to_path_buf(),
            source,
        })?;
    if !canonical.is_dir() {
        return Err(ResolutionError::NotADirectory(canonical));
    }

    let name = match module_name(&canonical)? {
        Some(name) => name,
        None => gopath_name(&canonical, gopath)?,
    };
    tracing::debug!(dir = %canonical.display(), name = %name, "package resolved");
    Ok(Package {
        dir: canonical,
        name,
    })
}

fn module_name(dir: &Path) -> Result<Option<String>, ResolutionError> {
    for root in dir.ancestors() {
        let go_mod = root.join("go.mod");
        if !go_mod.is_file() {
            continue;
        }
        let text = std::fs::read_to_string(&go_mod).map_err(|source| {
            ResolutionError::ReadModule {
                path: go_mod.clone(),
                source,
            }
        })?;
        let module = parse_module_line(&text).ok_or(ResolutionError::MissingModule(go_mod))?;
        let rel = dir.strip_prefix(root).unwrap_or_else(|_| Path::new(""));
        return Ok(Some(join_import_path(module, rel)));
    }
    Ok(None)
}

fn gopath_name(dir: &Path, gopath: Option<&OsStr>) -> Result<String, ResolutionError> {
    let gopath = gopath
        .filter(|g| !g.is_empty())
        .ok_or_else(|| ResolutionError::NoGopath(dir.to_path_buf()))?;
    for root in std::env::split_paths(gopath) {
        let src = root.canonicalize().unwrap_or(root).join("src");
        if let Ok(rel) = dir.strip_prefix(&src) {
            if rel.as_os_str().is_empty() {
                continue;
            }
            return Ok(join_import_path("", rel));
        }
    }
    Err(ResolutionError::OutsideGopath {
        dir: dir.to_path_buf(),
        gopath: gopath.to_string_lossy().into_owned(),
    })
}

/// Extracts the module path from `go.mod` text.
fn parse_module_line(text: &str) -> Option<&str> {
    text.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.split("//").next().unwrap_or_default().trim();
        let module = rest.trim_matches('"');
        (!module.is_empty()).then_some(module)
    })
}

/// Joins an import prefix and a relative path with `/` separators.
fn join_import_path(prefix: &str, rel: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !prefix.is_empty() {
        parts.push(prefix.to_owned());
    }
    parts.extend(rel.components().filter_map(|c| match c {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        _ => None,
    }));
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_uses_module_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("go.mod"), "module example.com/hello\n\ngo 1.22\n")
            .expect("go.mod");

        let package = resolve_package(dir.path(), None).expect("should resolve");
        assert_eq!(package.name, "example.com/hello");
        assert_eq!(package.dir, dir.path().canonicalize().expect("canonical"));
    }

    #[test]
    fn resolve_subdirectory_of_module() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("go.mod"), "module example.com/app\n").expect("go.mod");
        let sub = dir.path().join("cmd").join("server");
        std::fs::create_dir_all(&sub).expect("mkdir");

        let package = resolve_package(&sub, None).expect("should resolve");
        assert_eq!(package.name, "example.com/app/cmd/server");
    }

    #[test]
    fn resolve_falls_back_to_gopath() {
        let gopath = tempfile::tempdir().expect("tempdir");
        let pkg = gopath.path().join("src").join("github.com").join("me").join("svc");
        std::fs::create_dir_all(&pkg).expect("mkdir");

        let package =
            resolve_package(&pkg, Some(gopath.path().as_os_str())).expect("should resolve");
        assert_eq!(package.name, "github.com/me/svc");
    }

    #[test]
    fn resolve_outside_gopath_fails() {
        let gopath = tempfile::tempdir().expect("gopath");
        let elsewhere = tempfile::tempdir().expect("elsewhere");
        let err = resolve_package(elsewhere.path(), Some(gopath.path().as_os_str())).unwrap_err();
        assert!(matches!(err, ResolutionError::OutsideGopath { .. }), "got: {err}");
    }

    #[test]
    fn resolve_without_module_or_gopath_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = resolve_package(dir.path(), None).unwrap_err();
        assert!(matches!(err, ResolutionError::NoGopath(_)), "got: {err}");
    }

    #[test]
    fn resolve_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = resolve_package(&dir.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, ResolutionError::Canonicalize { .. }), "got: {err}");
    }

    #[test]
    fn resolve_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("main.go");
        std::fs::write(&file, "package main\n").expect("write");
        let err = resolve_package(&file, None).unwrap_err();
        assert!(matches!(err, ResolutionError::NotADirectory(_)), "got: {err}");
    }

    #[test]
    fn resolve_module_without_declaration_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("go.mod"), "go 1.22\n").expect("go.mod");
        let err = resolve_package(dir.path(), None).unwrap_err();
        assert!(matches!(err, ResolutionError::MissingModule(_)), "got: {err}");
    }

    #[test]
    fn parse_module_line_variants() {
        assert_eq!(parse_module_line("module a.b/c"), Some("a.b/c"));
        assert_eq!(parse_module_line("  module \"a.b/c\" // note"), Some("a.b/c"));
        assert_eq!(parse_module_line("modules x"), None);
        assert_eq!(parse_module_line("go 1.21\nmodule late\n"), Some("late"));
    }
}
