//! Errors produced while reading and validating config source.

use std::path::PathBuf;

use thiserror::Error;

/// A config source that could not be turned into a [`crate::Config`].
///
/// Line numbers are 1-based and refer to the line the offending token
/// starts on.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A directive name outside `env`, `port`, and `file`.
    #[error("line {line}: unknown directive `{name}` (expected env, port, or file)")]
    UnknownDirective {
        /// Line of the directive name.
        line: usize,
        /// Directive name as written.
        name: String,
    },

    /// A `port` argument that is not an integer in `1..=65535`.
    #[error("line {line}: invalid port `{value}` (expected an integer in 1..=65535)")]
    InvalidPort {
        /// Line of the port argument.
        line: usize,
        /// Argument as written.
        value: String,
    },

    /// A directive with no argument, or an empty quoted one.
    #[error("line {line}: `{directive}` requires an argument")]
    MissingArgument {
        /// Line of the directive name.
        line: usize,
        /// Directive that lacks its argument.
        directive: &'static str,
    },

    /// A directive whose argument is not followed by `;`.
    #[error("line {line}: expected `;` to end `{directive}` directive, found {found}")]
    MissingTerminator {
        /// Line where the terminator was expected.
        line: usize,
        /// Directive being terminated.
        directive: &'static str,
        /// Description of what was found instead.
        found: String,
    },

    /// A token that cannot start a directive.
    #[error("line {line}: expected a directive name, found {found}")]
    UnexpectedToken {
        /// Line of the token.
        line: usize,
        /// Description of the token.
        found: String,
    },

    /// Source text that could not be tokenized.
    #[error("line {line}: {message}")]
    Lex {
        /// Line where tokenizing stopped.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// The config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ConfigError>;
