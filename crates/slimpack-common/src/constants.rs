//! Well-known names, paths, and defaults.

/// File name of the compiled artifact inside the workspace.
pub const ARTIFACT_NAME: &str = "server_linux64";

/// Directory inside the image where the artifact is placed.
pub const ARTIFACT_INSTALL_DIR: &str = "/usr/local/bin";

/// Base image used when none is supplied.
pub const DEFAULT_BASE_IMAGE: &str = "scratch";

/// Name of the declarative config file looked up in the package directory.
pub const CONFIG_FILE_NAME: &str = "slimpack.cfg";

/// Name of the rendered manifest inside the workspace.
pub const MANIFEST_FILE_NAME: &str = "Dockerfile";

/// Prefix for temporary workspace directories.
pub const WORKSPACE_PREFIX: &str = "slimpack";

/// Default image-builder program.
pub const DEFAULT_BUILDER: &str = "docker";

/// Default archiver program.
pub const DEFAULT_ARCHIVER: &str = "tar";

/// Default compiler program.
pub const DEFAULT_COMPILER: &str = "go";

/// Target operating system for the static artifact.
pub const TARGET_OS: &str = "linux";

/// Target architecture for the static artifact.
pub const TARGET_ARCH: &str = "amd64";

/// Default number of in-flight chunks between archiver and builder.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Default size in bytes of a single streamed chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Returns the absolute path of the artifact inside the image.
#[must_use]
pub fn artifact_install_path(artifact: &str) -> String {
    format!("{ARTIFACT_INSTALL_DIR}/{artifact}")
}
