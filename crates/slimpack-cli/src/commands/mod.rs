//! CLI command definitions and dispatch.

pub mod build;
pub mod check;

use clap::{Parser, Subcommand};

/// slimpack: static Go binaries into minimal container images.
#[derive(Parser, Debug)]
#[command(name = "slimpack", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Log each stage and the rendered manifest.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a package and build its container image.
    Build(build::BuildArgs),
    /// Resolve a package and validate its config without building.
    Check(check::CheckArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails. Pipeline failures
/// carry a [`slimpack_runtime::PipelineError`] that determines the exit
/// status.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Build(args) => build::execute(args),
        Command::Check(args) => check::execute(&args),
    }
}
