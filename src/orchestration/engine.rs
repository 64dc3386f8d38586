//! Container engine invocations
//!
//! Builds the exact command lines the extraction pipeline runs. The image
//! tag and container name are host-wide singletons: two batches running
//! at the same time on one host will clobber each other.

use crate::error::DanceError;
use crate::orchestration::runner::{CommandSpec, ProcessRunner};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Tag of the throwaway extraction image
pub const EXTRACT_IMAGE_TAG: &str = "dance:extract";

/// Name of the throwaway extraction container
pub const CACHE_CONTAINER_NAME: &str = "cache-container";

/// Directory inside the extraction image holding copied caches
pub const CONTAINER_CACHE_ROOT: &str = "/var/dance-cache";

/// When destination removal is run through `sudo`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SudoMode {
    /// Use sudo unless already running as root
    #[default]
    Auto,
    /// Always use sudo
    Always,
    /// Never use sudo
    Never,
}

impl SudoMode {
    /// Whether this mode results in a sudo prefix for the current process
    pub fn use_sudo(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => !running_as_root(),
        }
    }
}

impl fmt::Display for SudoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Always => write!(f, "always"),
            Self::Never => write!(f, "never"),
        }
    }
}

#[cfg(unix)]
fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}

/// Result of clearing the container slot
#[derive(Debug)]
pub enum RemovalOutcome {
    /// A container existed and was removed
    Removed,
    /// No container held the name
    Absent,
    /// Removal failed for another reason
    Failed(DanceError),
}

/// Builds invocations for a docker-compatible CLI
#[derive(Debug, Clone)]
pub struct ContainerEngine {
    program: String,
}

impl ContainerEngine {
    /// Create an engine that invokes `program` (e.g. `docker`)
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `buildx build` of `context` with `dancefile`, loaded as `dance:extract`
    pub fn build(&self, dancefile: &Path, context: &Path, builder: Option<&str>) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.program).args(["buildx", "build"]);
        if let Some(builder) = builder {
            cmd = cmd.args(["--builder", builder]);
        }
        cmd.arg("-f")
            .arg(dancefile.display().to_string())
            .args(["--tag", EXTRACT_IMAGE_TAG, "--load"])
            .arg(context.display().to_string())
    }

    /// Forced removal of the extraction container
    pub fn remove_container_command(&self) -> CommandSpec {
        CommandSpec::new(&self.program).args(["rm", "-f", CACHE_CONTAINER_NAME])
    }

    /// Clear the container slot, classifying the result
    pub async fn remove_container(&self, runner: &dyn ProcessRunner) -> RemovalOutcome {
        match runner.run(&self.remove_container_command()).await {
            Ok(()) => RemovalOutcome::Removed,
            Err(err) if is_absent_container(&err) => RemovalOutcome::Absent,
            Err(err) => {
                debug!("Container removal failed: {}", err);
                RemovalOutcome::Failed(err)
            }
        }
    }

    /// Create (without starting) the extraction container
    pub fn create_container(&self) -> CommandSpec {
        CommandSpec::new(&self.program).args([
            "create",
            "-ti",
            "--name",
            CACHE_CONTAINER_NAME,
            EXTRACT_IMAGE_TAG,
        ])
    }

    /// Stream the cache root out of the container as a tar archive
    pub fn copy_out(&self) -> CommandSpec {
        CommandSpec::new(&self.program).args([
            "cp".to_string(),
            "-L".to_string(),
            format!("{}:{}", CACHE_CONTAINER_NAME, CONTAINER_CACHE_ROOT),
            "-".to_string(),
        ])
    }
}

/// Unpack a POSIX tar archive from stdin into `dir`
pub fn archive_extract(dir: &Path) -> CommandSpec {
    CommandSpec::new("tar")
        .args(["-H", "posix", "-x", "-C"])
        .arg(dir.display().to_string())
}

/// Forced recursive removal of `path`, optionally through sudo
pub fn privileged_remove(path: &Path, sudo: bool) -> CommandSpec {
    let cmd = if sudo {
        CommandSpec::new("sudo").arg("rm")
    } else {
        CommandSpec::new("rm")
    };
    cmd.arg("-rf").arg(path.display().to_string())
}

fn is_absent_container(err: &DanceError) -> bool {
    match err {
        DanceError::CommandExecution { stderr, .. } => {
            stderr.to_lowercase().contains("no such container")
        }
        _ => false,
    }
}
