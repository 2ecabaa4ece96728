//! Pipeline stages and their termination statuses.

use std::fmt;

use slimpack_config::ConfigError;
use slimpack_image::{PackagingError, RenderError};
use thiserror::Error;

use crate::compile::CompileError;
use crate::resolve::ResolutionError;
use crate::workspace::WorkspaceError;

/// Termination status for invalid command-line usage.
pub const EXIT_USAGE: u8 = 1;

/// Termination status for a failure outside every pipeline stage, such as
/// being unable to write command output.
pub const EXIT_FAILURE: u8 = 8;

/// One step of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Locate the package directory and its name.
    ResolvePackage,
    /// Read and validate the declarative config.
    ValidateConfig,
    /// Create (or adopt) the build workspace.
    PrepareWorkspace,
    /// Compile the static artifact into the workspace.
    Compile,
    /// Render the manifest and write it into the workspace.
    RenderManifest,
    /// Stream the workspace into the image builder.
    Package,
}

impl Stage {
    /// Termination status reported when this stage fails.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::ResolvePackage => 2,
            Self::PrepareWorkspace => 3,
            Self::ValidateConfig => 4,
            Self::Compile => 5,
            Self::RenderManifest => 6,
            Self::Package => 7,
        }
    }

    /// Human-readable stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResolvePackage => "resolve package",
            Self::ValidateConfig => "validate config",
            Self::PrepareWorkspace => "prepare workspace",
            Self::Compile => "compile",
            Self::RenderManifest => "render manifest",
            Self::Package => "package",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pipeline run aborted at one stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The package directory could not be resolved.
    #[error("package resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    /// The config file is unreadable or invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The workspace could not be prepared.
    #[error("workspace setup failed: {0}")]
    Workspace(#[from] WorkspaceError),

    /// The compiler failed.
    #[error("compilation failed: {0}")]
    Compile(#[from] CompileError),

    /// The manifest could not be rendered or written.
    #[error("manifest rendering failed: {0}")]
    Render(#[from] RenderError),

    /// The archiver or builder failed.
    #[error("packaging failed: {0}")]
    Packaging(#[from] PackagingError),
}

impl PipelineError {
    /// The stage this error aborted.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Resolution(_) => Stage::ResolvePackage,
            Self::Config(_) => Stage::ValidateConfig,
            Self::Workspace(_) => Stage::PrepareWorkspace,
            Self::Compile(_) => Stage::Compile,
            Self::Render(_) => Stage::RenderManifest,
            Self::Packaging(_) => Stage::Package,
        }
    }

    /// Termination status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.stage().exit_code()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const ALL: [Stage; 6] = [
        Stage::ResolvePackage,
        Stage::ValidateConfig,
        Stage::PrepareWorkspace,
        Stage::Compile,
        Stage::RenderManifest,
        Stage::Package,
    ];

    #[test]
    fn exit_codes_are_distinct_and_nonzero() {
        let codes: HashSet<u8> = ALL.iter().map(|s| s.exit_code()).collect();
        assert_eq!(codes.len(), ALL.len());
        assert!(!codes.contains(&0));
        assert!(!codes.contains(&EXIT_USAGE));
        assert!(!codes.contains(&EXIT_FAILURE));
        assert_ne!(EXIT_USAGE, EXIT_FAILURE);
    }

    #[test]
    fn config_error_maps_to_validate_stage() {
        let err = PipelineError::from(ConfigError::UnknownDirective {
            line: 1,
            name: "volume".into(),
        });
        assert_eq!(err.stage(), Stage::ValidateConfig);
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().starts_with("invalid configuration: line 1"));
    }

    #[test]
    fn render_error_maps_to_render_stage() {
        let err = PipelineError::from(RenderError::from(
            slimpack_image::TemplateError::InvalidBaseImage(String::new()),
        ));
        assert_eq!(err.stage(), Stage::RenderManifest);
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn stage_display_names_stage() {
        assert_eq!(Stage::RenderManifest.to_string(), "render manifest");
    }
}
