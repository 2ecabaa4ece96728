//! The build pipeline state machine.
//!
//! ```text
//! ResolvePackage → ValidateConfig → PrepareWorkspace → Compile → RenderManifest
//!                                                                    │
//!                                                  dry run ◀─────────┤
//!                                                                    ▼
//!                                                                 Package
//! ```
//!
//! A failing stage ends the run with that stage's [`PipelineError`]. No
//! stage is retried. The workspace is released when the run returns.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::PathBuf;

use slimpack_common::constants::{ARTIFACT_NAME, CONFIG_FILE_NAME};
use slimpack_config::Config;
use slimpack_image::{
    EnvironmentSnapshot, Manifest, Packager, PackagingResult, RenderError, StreamingPackager,
    render,
};

use crate::compile::{Compiler, GoCompiler};
use crate::error::{PipelineError, Stage};
use crate::resolve::{Package, resolve_package};
use crate::workspace::Workspace;

/// Per-run options.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory of the package to build.
    pub package_dir: PathBuf,
    /// Config file, defaulting to `slimpack.cfg` in the package directory.
    pub config_path: Option<PathBuf>,
    /// Base image for the `FROM` line.
    pub base_image: Option<String>,
    /// Tag for the built image.
    pub tag: Option<String>,
    /// Workspace directory to use instead of a temporary one.
    pub workspace_dir: Option<PathBuf>,
    /// Keep the temporary workspace after the run.
    pub keep_workspace: bool,
    /// Stop after rendering the manifest.
    pub dry_run: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            package_dir: PathBuf::from("."),
            config_path: None,
            base_image: None,
            tag: None,
            workspace_dir: None,
            keep_workspace: false,
            dry_run: false,
        }
    }
}

/// What a successful run produced.
#[derive(Debug)]
pub struct PipelineReport {
    /// Resolved package.
    pub package: Package,
    /// Validated config.
    pub config: Config,
    /// Rendered manifest.
    pub manifest: Manifest,
    /// Workspace directory used by the run.
    pub workspace: PathBuf,
    /// Whether the workspace still exists.
    pub workspace_retained: bool,
    /// Packaging outcome, `None` for a dry run.
    pub packaging: Option<PackagingResult>,
}

/// Sequences the stages of one build.
pub struct Pipeline {
    compiler: Box<dyn Compiler>,
    packager: Box<dyn Packager>,
    host_env: HashMap<String, String>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(
            Box::new(GoCompiler::default()),
            Box::new(StreamingPackager::default()),
        )
    }
}

impl Pipeline {
    /// Creates a pipeline over the given collaborators, snapshotting the
    /// current process environment.
    #[must_use]
    pub fn new(compiler: Box<dyn Compiler>, packager: Box<dyn Packager>) -> Self {
        let host_env = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self {
            compiler,
            packager,
            host_env,
        }
    }

    /// Replaces the host environment snapshot.
    #[must_use]
    pub fn with_host_env(mut self, host_env: HashMap<String, String>) -> Self {
        self.host_env = host_env;
        self
    }

    /// Runs every stage in order.
    ///
    /// # Errors
    ///
    /// Returns the [`PipelineError`] of the first stage that fails.
    pub fn run(&self, options: &PipelineOptions) -> Result<PipelineReport, PipelineError> {
        enter(Stage::ResolvePackage);
        let gopath = self.host_env.get("GOPATH").map(OsStr::new);
        let package = resolve_package(&options.package_dir, gopath)?;
        tracing::info!(package = %package.name, dir = %package.dir.display(), "package name");

        enter(Stage::ValidateConfig);
        let config_path = options
            .config_path
            .clone()
            .unwrap_or_else(|| package.dir.join(CONFIG_FILE_NAME));
        let config = slimpack_config::load(&config_path)?;
        tracing::info!(
            path = %config_path.display(),
            env = ?config.env_names,
            ports = ?config.ports,
            files = ?config.files,
            "config validated"
        );

        enter(Stage::PrepareWorkspace);
        let workspace =
            Workspace::create(options.workspace_dir.as_deref(), options.keep_workspace)?;

        enter(Stage::Compile);
        self.compiler
            .compile(&package, &workspace.path().join(ARTIFACT_NAME))?;

        enter(Stage::RenderManifest);
        let env = EnvironmentSnapshot::capture(&config.env_names, |name| {
            self.host_env.get(name).cloned()
        });
        let manifest = render(&config, &env, options.base_image.as_deref(), ARTIFACT_NAME)
            .map_err(RenderError::from)?;
        let _ = manifest.write_to(workspace.path())?;
        tracing::info!(
            digest = %manifest.digest(),
            base_image = %manifest.base_image,
            "manifest rendered:\n{}",
            manifest.text
        );

        let packaging = if options.dry_run {
            tracing::info!("dry run, skipping packaging");
            None
        } else {
            enter(Stage::Package);
            let result = self
                .packager
                .package(workspace.path(), options.tag.as_deref())?
                .into_result()?;
            tracing::info!(bytes = result.bytes_streamed, "image built");
            Some(result)
        };

        Ok(PipelineReport {
            package,
            config,
            manifest,
            workspace: workspace.path().to_path_buf(),
            workspace_retained: workspace.is_retained(),
            packaging,
        })
    }
}

fn enter(stage: Stage) {
    tracing::debug!(stage = %stage, "entering stage");
}
