//! Parsed form of a config source.

use std::fmt;

use serde::Serialize;

/// The closed set of directive names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `env <NAME>;`
    Env,
    /// `port <NUMBER>;`
    Port,
    /// `file <PATH>;`
    File,
}

impl DirectiveKind {
    /// Looks up a directive by its keyword. Keywords are case-sensitive.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "env" => Some(Self::Env),
            "port" => Some(Self::Port),
            "file" => Some(Self::File),
            _ => None,
        }
    }

    /// Returns the keyword for this directive.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Port => "port",
            Self::File => "file",
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated statement from the config source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Directive {
    /// Host environment variable to copy into the image.
    Env(String),
    /// Port to expose, always in `1..=65535`.
    Port(u16),
    /// Extra file to include. Parsed and kept, not yet used downstream.
    File(String),
}

impl Directive {
    /// Returns the kind of this directive.
    #[must_use]
    pub const fn kind(&self) -> DirectiveKind {
        match self {
            Self::Env(_) => DirectiveKind::Env,
            Self::Port(_) => DirectiveKind::Port,
            Self::File(_) => DirectiveKind::File,
        }
    }
}

/// Structured configuration for one run.
///
/// Each list keeps source order and duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Names from `env` directives, exactly as written.
    pub env_names: Vec<String>,
    /// Values from `port` directives.
    pub ports: Vec<u16>,
    /// Paths from `file` directives.
    pub files: Vec<String>,
}

impl Config {
    /// Folds directives into a config, preserving order within each kind.
    #[must_use]
    pub fn from_directives(directives: impl IntoIterator<Item = Directive>) -> Self {
        let mut config = Self::default();
        for directive in directives {
            match directive {
                Directive::Env(name) => config.env_names.push(name),
                Directive::Port(port) => config.ports.push(port),
                Directive::File(path) => config.files.push(path),
            }
        }
        config
    }

    /// Returns `true` if no directive was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.env_names.is_empty() && self.ports.is_empty() && self.files.is_empty()
    }
}
