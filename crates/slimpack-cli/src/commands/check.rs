//! `slimpack check`: Resolve a package and validate its config.

use std::path::PathBuf;

use clap::Args;
use slimpack_common::constants::CONFIG_FILE_NAME;
use slimpack_runtime::{PipelineError, resolve_package};

use crate::output::describe_config;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Package directory to check.
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Config file (defaults to `slimpack.cfg` in the package directory).
    #[arg(short, long, env = "SLIMPACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the parsed config as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `check` command.
///
/// # Errors
///
/// Returns a [`PipelineError`] if the package cannot be resolved or the
/// config is invalid.
pub fn execute(args: &CheckArgs) -> anyhow::Result<()> {
    let gopath = std::env::var_os("GOPATH");
    let package = resolve_package(&args.dir, gopath.as_deref()).map_err(PipelineError::from)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| package.dir.join(CONFIG_FILE_NAME));
    let config = slimpack_config::load(&config_path).map_err(PipelineError::from)?;
    tracing::info!(path = %config_path.display(), "config valid");

    if args.json {
        let value = serde_json::json!({
            "package": package.name,
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", describe_config(&package.name, &config));
    }
    Ok(())
}
