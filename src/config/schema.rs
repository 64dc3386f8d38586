//! Configuration schema for cache-dance
//!
//! Global configuration is stored at `~/.config/cache-dance/config.toml`,
//! project overrides in `.cache-dance.toml`.

use crate::cache::{CacheSource, MountOptions, Sharing};
use crate::orchestration::SudoMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default utility image used as the base of the extraction build
pub const DEFAULT_UTILITY_IMAGE: &str = "ghcr.io/containerd/busybox:latest";

/// Default scratch directory, relative to the working directory
pub const DEFAULT_SCRATCH_DIR: &str = "scratch";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extraction settings
    pub extract: ExtractConfig,

    /// Caches to extract, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub caches: Vec<CacheEntry>,
}

/// Extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Staging directory for the Dancefile, stamp and extracted archive
    pub scratch_dir: PathBuf,

    /// Base image of the extraction build
    pub utility_image: String,

    /// Named buildx builder (default builder when unset)
    pub builder: Option<String>,

    /// Skip extraction entirely
    pub skip_extraction: bool,

    /// Container engine CLI
    pub engine: String,

    /// Directory that receives the extracted caches (current directory when unset)
    pub workdir: Option<PathBuf>,

    /// Whether destination removal runs through sudo
    pub sudo: SudoMode,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            utility_image: DEFAULT_UTILITY_IMAGE.to_string(),
            builder: None,
            skip_extraction: false,
            engine: "docker".to_string(),
            workdir: None,
            sudo: SudoMode::Auto,
        }
    }
}

/// One `[[caches]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheEntry {
    /// Cache source name; also the extracted directory name
    pub source: CacheSource,

    /// Mount target inside the build
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharing: Option<Sharing>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl CacheEntry {
    /// Mount options described by this entry
    pub fn mount_options(&self) -> MountOptions {
        MountOptions {
            target: self.target.clone(),
            id: self.id.clone(),
            sharing: self.sharing,
            uid: self.uid,
            gid: self.gid,
            mode: self.mode.clone(),
            from: self.from.clone(),
        }
    }
}
