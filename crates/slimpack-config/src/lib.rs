//! # slimpack-config
//!
//! Validator for the `slimpack.cfg` declarative config language.
//!
//! The language has exactly three directives, each terminated by `;`:
//!
//! ```text
//! // variables copied from the build host into the image
//! env HELLO_MESSAGE;
//! port 8080;
//! file "static assets/index.html";
//! ```
//!
//! Source text is parsed straight into [`Directive`] variants and folded
//! into a [`Config`]. There is no separate schema-checking pass.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod error;
pub mod parser;

use std::path::Path;

pub use error::{ConfigError, Result};
pub use parser::ast::{Config, Directive, DirectiveKind};
pub use parser::parse_config;

/// Validates optional config source text.
///
/// An absent source yields an empty [`Config`]; it is not an error.
///
/// # Errors
///
/// Returns a [`ConfigError`] describing the first invalid directive.
pub fn validate(source: Option<&str>) -> Result<Config> {
    source.map_or_else(|| Ok(Config::default()), parse_config)
}

/// Reads and validates the config file at `path`.
///
/// A missing file is treated as an empty config.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file exists but cannot be read, or
/// a validation error for its contents.
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using empty config");
        return validate(None);
    }
    let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "using config file");
    validate(Some(&source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_absent_source_is_empty_config() {
        let config = validate(None).expect("absent source should validate");
        assert_eq!(config, Config::default());
        assert!(config.is_empty());
    }

    #[test]
    fn load_missing_file_is_empty_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load(&dir.path().join("slimpack.cfg")).expect("should load");
        assert!(config.is_empty());
    }

    #[test]
    fn load_reads_file_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("slimpack.cfg");
        std::fs::write(&path, "env FOO;\nport 8080;\n").expect("write config");

        let config = load(&path).expect("should load");
        assert_eq!(config.env_names, vec!["FOO"]);
        assert_eq!(config.ports, vec![8080]);
    }

    #[test]
    fn load_reports_invalid_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("slimpack.cfg");
        std::fs::write(&path, "volume /data;\n").expect("write config");

        match load(&path).unwrap_err() {
            ConfigError::UnknownDirective { name, .. } => assert_eq!(name, "volume"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_directory_is_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }), "got: {err}");
    }
}
