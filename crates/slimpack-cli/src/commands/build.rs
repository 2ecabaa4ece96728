//! `slimpack build`: Compile a package and stream it into an image build.

use std::path::PathBuf;

use clap::Args;
use slimpack_common::constants::{
    DEFAULT_BASE_IMAGE, DEFAULT_BUILDER, DEFAULT_CHANNEL_CAPACITY, DEFAULT_CHUNK_SIZE,
    DEFAULT_COMPILER,
};
use slimpack_image::StreamingPackager;
use slimpack_runtime::{GoCompiler, Pipeline, PipelineOptions};

use crate::output::format_bytes;

/// Arguments for the `build` command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Package directory to build.
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Config file (defaults to `slimpack.cfg` in the package directory).
    #[arg(short, long, env = "SLIMPACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base image for the manifest.
    #[arg(short, long, env = "SLIMPACK_FROM", default_value = DEFAULT_BASE_IMAGE)]
    pub from: String,

    /// Tag for the built image.
    #[arg(short, long, env = "SLIMPACK_TAG")]
    pub tag: Option<String>,

    /// Image builder program, invoked as `<builder> build [-t TAG] -`.
    #[arg(short = 'd', long, env = "SLIMPACK_BUILDER", default_value = DEFAULT_BUILDER)]
    pub builder: String,

    /// Go toolchain program.
    #[arg(long, env = "SLIMPACK_COMPILER", default_value = DEFAULT_COMPILER)]
    pub compiler: String,

    /// Build in this directory instead of a temporary one. Never deleted.
    #[arg(short = 'w', long, env = "SLIMPACK_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Keep the temporary workspace after the run.
    #[arg(short, long)]
    pub keep: bool,

    /// Render the manifest and stop before packaging.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Chunks buffered between archiver and builder.
    #[arg(long, default_value_t = DEFAULT_CHANNEL_CAPACITY, value_parser = parse_nonzero)]
    pub channel_capacity: usize,

    /// Bytes per buffered chunk.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, value_parser = parse_nonzero)]
    pub chunk_size: usize,
}

impl BuildArgs {
    fn options(&self) -> PipelineOptions {
        PipelineOptions {
            package_dir: self.dir.clone(),
            config_path: self.config.clone(),
            base_image: Some(self.from.clone()),
            tag: self.tag.clone(),
            workspace_dir: self.workspace.clone(),
            keep_workspace: self.keep,
            dry_run: self.dry_run,
        }
    }
}

fn parse_nonzero(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_owned()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Executes the `build` command.
///
/// A dry run prints the rendered manifest to stdout.
///
/// # Errors
///
/// Returns the [`slimpack_runtime::PipelineError`] of the failed stage.
pub fn execute(args: BuildArgs) -> anyhow::Result<()> {
    let options = args.options();
    let compiler = GoCompiler::new(args.compiler);
    let packager = StreamingPackager::new(args.builder)
        .with_channel(args.channel_capacity, args.chunk_size);
    let pipeline = Pipeline::new(Box::new(compiler), Box::new(packager));

    let report = pipeline.run(&options)?;

    if let Some(packaging) = &report.packaging {
        println!(
            "Built {} ({} streamed)",
            options.tag.as_deref().unwrap_or(&report.package.name),
            format_bytes(packaging.bytes_streamed)
        );
    } else {
        print!("{}", report.manifest.text);
    }
    if report.workspace_retained {
        eprintln!("workspace kept at {}", report.workspace.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nonzero_rejects_zero() {
        assert!(parse_nonzero("0").is_err());
        assert!(parse_nonzero("abc").is_err());
        assert_eq!(parse_nonzero("8"), Ok(8));
    }
}
