//! Cache mount options
//!
//! Converts the user-facing description of a cache (a bare target path or
//! a table of BuildKit cache mount options) into the two values the
//! extraction pipeline needs: the target path inside the build and the
//! literal `--mount=` argument.

use serde::{Deserialize, Serialize};
use std::fmt;

/// BuildKit cache sharing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sharing {
    Shared,
    Private,
    Locked,
}

impl fmt::Display for Sharing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::Private => write!(f, "private"),
            Self::Locked => write!(f, "locked"),
        }
    }
}

/// Options of a `--mount=type=cache` instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MountOptions {
    /// Path where the cache is mounted inside the build
    pub target: String,

    /// Cache id (defaults to the target on the BuildKit side)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Sharing mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharing: Option<Sharing>,

    /// Owner user id of the cache directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,

    /// Owner group id of the cache directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,

    /// File mode of the cache directory (e.g. "0755")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Build stage to use as the base of the cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl MountOptions {
    /// Options for a plain target with BuildKit defaults for everything else
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            id: None,
            sharing: None,
            uid: None,
            gid: None,
            mode: None,
            from: None,
        }
    }

    /// Render the comma-separated mount specification
    pub fn mount_args(&self) -> String {
        let mut parts = vec!["type=cache".to_string(), format!("target={}", self.target)];

        if let Some(id) = &self.id {
            parts.push(format!("id={}", id));
        }
        if let Some(sharing) = self.sharing {
            parts.push(format!("sharing={}", sharing));
        }
        if let Some(uid) = self.uid {
            parts.push(format!("uid={}", uid));
        }
        if let Some(gid) = self.gid {
            parts.push(format!("gid={}", gid));
        }
        if let Some(mode) = &self.mode {
            parts.push(format!("mode={}", mode));
        }
        if let Some(from) = &self.from {
            parts.push(format!("from={}", from));
        }

        parts.join(",")
    }
}

/// A cache value as written by the user: `"/root/.npm"` or `{ target = ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheSpec {
    Target(String),
    Detailed(MountOptions),
}

impl From<CacheSpec> for MountOptions {
    fn from(spec: CacheSpec) -> Self {
        match spec {
            CacheSpec::Target(target) => MountOptions::for_target(target),
            CacheSpec::Detailed(options) => options,
        }
    }
}

/// Resolved, immutable options for one cache source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    target_path: String,
    mount_args: String,
}

impl CacheOptions {
    /// Resolve mount options into the values used by the pipeline
    pub fn new(options: &MountOptions) -> Self {
        Self {
            target_path: options.target.clone(),
            mount_args: options.mount_args(),
        }
    }

    /// Path inside the build where the cache contents live
    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    /// Literal `--mount=` fragment for the generated RUN instruction
    pub fn mount_args(&self) -> &str {
        &self.mount_args
    }
}

impl From<&MountOptions> for CacheOptions {
    fn from(options: &MountOptions) -> Self {
        Self::new(options)
    }
}
