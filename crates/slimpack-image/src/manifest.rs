//! Container-build manifest rendering.
//!
//! Rendering is a pure function of the config, an [`EnvironmentSnapshot`],
//! the base image, and the artifact name. The snapshot is built by
//! [`EnvironmentSnapshot::capture`] from whatever lookup the caller
//! supplies, so rendering itself never reads the process environment.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use slimpack_common::constants::{DEFAULT_BASE_IMAGE, MANIFEST_FILE_NAME, artifact_install_path};
use slimpack_config::Config;
use thiserror::Error;

/// Inputs that cannot be expressed in manifest syntax.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The base image reference is empty or contains whitespace.
    #[error("invalid base image reference {0:?}")]
    InvalidBaseImage(String),

    /// The artifact name is empty or contains whitespace or a separator.
    #[error("invalid artifact name {0:?}")]
    InvalidArtifact(String),

    /// An environment variable name that cannot appear in an `ENV` line.
    #[error("environment variable name {0:?} cannot be written to the manifest")]
    InvalidEnvName(String),

    /// An environment value spanning several lines.
    #[error("value of environment variable {name} contains a line break")]
    MultilineValue {
        /// Name of the offending variable.
        name: String,
    },

    /// Writing into the output buffer failed.
    #[error("failed to format manifest: {0}")]
    Format(#[from] std::fmt::Error),

    /// Encoding the entry-point array failed.
    #[error("failed to encode entry point: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure to produce the manifest file in the workspace.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The manifest text could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The rendered manifest could not be written.
    #[error("failed to write manifest {path}: {source}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Values of the declared environment variables that are set on the host.
///
/// Entries keep declaration order. A name declared twice appears once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    entries: Vec<(String, String)>,
}

impl EnvironmentSnapshot {
    /// Captures `names` through `lookup`.
    ///
    /// Names the lookup does not know, or knows with an empty value, are
    /// left out.
    pub fn capture<F>(names: &[String], mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for name in names {
            if !seen.insert(name.as_str()) {
                continue;
            }
            match lookup(name).filter(|value| !value.is_empty()) {
                Some(value) => {
                    tracing::debug!(name = %name, "environment variable added to manifest");
                    entries.push((name.clone(), value));
                }
                None => {
                    tracing::debug!(name = %name, "environment variable not set, skipped");
                }
            }
        }
        Self { entries }
    }

    /// Returns the captured value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over captured `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of captured variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A rendered manifest and the inputs it was rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Manifest text, one instruction per line.
    pub text: String,
    /// Base image in the `FROM` line.
    pub base_image: String,
    /// `ENV` pairs in emitted order.
    pub env: Vec<(String, String)>,
    /// `EXPOSE` ports in emitted order.
    pub ports: Vec<u16>,
    /// Absolute artifact path inside the image.
    pub artifact_path: String,
}

impl Manifest {
    /// Hex SHA-256 of the manifest text.
    #[must_use]
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.text.as_bytes()))
    }

    /// Writes the manifest into `dir` under its well-known file name.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Write`] if the file cannot be written.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, RenderError> {
        let path = dir.join(MANIFEST_FILE_NAME);
        std::fs::write(&path, &self.text).map_err(|source| RenderError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), digest = %self.digest(), "manifest written");
        Ok(path)
    }
}

fn is_plain_token(text: &str) -> bool {
    !text.is_empty() && !text.chars().any(char::is_whitespace)
}

/// Quotes an `ENV` value, escaping characters the builder would interpret.
fn quote_env_value(name: &str, value: &str) -> Result<String, TemplateError> {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\n' | '\r' => {
                return Err(TemplateError::MultilineValue {
                    name: name.to_owned(),
                });
            }
            '"' | '\\' | '$' => {
                quoted.push('\\');
                quoted.push(c);
            }
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    Ok(quoted)
}

/// Renders the manifest.
///
/// Lines, in order: `FROM`, `ADD` of the artifact, one `ENV` per declared
/// variable present in `env` (declaration order), one `EXPOSE` per
/// declared port (duplicates kept), and the `CMD` entry point.
///
/// # Errors
///
/// Returns a [`TemplateError`] if an input cannot be represented.
pub fn render(
    config: &Config,
    env: &EnvironmentSnapshot,
    base_image: Option<&str>,
    artifact: &str,
) -> Result<Manifest, TemplateError> {
    let base_image = base_image.unwrap_or(DEFAULT_BASE_IMAGE);
    if !is_plain_token(base_image) {
        return Err(TemplateError::InvalidBaseImage(base_image.to_owned()));
    }
    if !is_plain_token(artifact) || artifact.contains('/') {
        return Err(TemplateError::InvalidArtifact(artifact.to_owned()));
    }
    let artifact_path = artifact_install_path(artifact);

    let mut seen = HashSet::new();
    let mut env_pairs = Vec::new();
    for name in &config.env_names {
        if !seen.insert(name.as_str()) {
            continue;
        }
        if let Some(value) = env.get(name) {
            if !is_plain_token(name) || name.contains('=') {
                return Err(TemplateError::InvalidEnvName(name.clone()));
            }
            env_pairs.push((name.clone(), value.to_owned()));
        }
    }

    let mut text = String::new();
    writeln!(text, "FROM {base_image}")?;
    writeln!(text, "ADD {artifact} {artifact_path}")?;
    for (name, value) in &env_pairs {
        writeln!(text, "ENV {name}={}", quote_env_value(name, value)?)?;
    }
    for port in &config.ports {
        writeln!(text, "EXPOSE {port}")?;
    }
    let entrypoint = serde_json::to_string(&[artifact_path.as_str()])?;
    writeln!(text, "CMD {entrypoint}")?;

    tracing::debug!(
        base_image,
        env = env_pairs.len(),
        ports = ?config.ports,
        "manifest rendered"
    );

    Ok(Manifest {
        text,
        base_image: base_image.to_owned(),
        env: env_pairs,
        ports: config.ports.clone(),
        artifact_path,
    })
}
