//! Options resolution
//!
//! Turns the loaded configuration plus command line overrides into the
//! values the extraction batch runs with. Precedence is override, then
//! configuration file, then built-in default.

use crate::cache::map::CacheMap;
use crate::config::Config;
use crate::error::{DanceError, DanceResult};
use crate::orchestration::SudoMode;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Command line (or environment) overrides for a single run
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// JSON cache map; replaces the configured `[[caches]]` entirely
    pub cache_map: Option<String>,
    pub scratch_dir: Option<PathBuf>,
    pub utility_image: Option<String>,
    pub builder: Option<String>,
    /// Only ever turns skipping on
    pub skip_extraction: bool,
    pub engine: Option<String>,
    pub workdir: Option<PathBuf>,
    pub sudo: Option<SudoMode>,
}

/// Fully resolved extraction options
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub cache_map: CacheMap,
    /// Absolute, or relative to the process working directory
    pub scratch_dir: PathBuf,
    pub utility_image: String,
    pub builder: Option<String>,
    pub skip_extraction: bool,
    pub engine: String,
    pub workdir: PathBuf,
    pub sudo: SudoMode,
}

/// Resolve configuration and overrides into extraction options
pub fn resolve(config: &Config, overrides: &Overrides) -> DanceResult<ResolvedOptions> {
    let extract = &config.extract;

    let cache_map = match &overrides.cache_map {
        Some(json) => {
            debug!("Using cache map from command line");
            CacheMap::from_json(json)?
        }
        None => CacheMap::from_pairs(
            config
                .caches
                .iter()
                .map(|entry| (entry.source.clone(), entry.mount_options())),
        )?,
    };

    let workdir = match overrides.workdir.as_ref().or(extract.workdir.as_ref()) {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|e| DanceError::io("getting current directory", e))?,
    };

    let scratch_dir = anchor(
        &workdir,
        overrides
            .scratch_dir
            .as_deref()
            .unwrap_or(extract.scratch_dir.as_path()),
    );

    for source in cache_map.sources() {
        if scratch_dir.starts_with(workdir.join(source.as_str())) {
            return Err(DanceError::invalid_source(
                source.as_str(),
                format!(
                    "its destination would contain the scratch directory {}",
                    scratch_dir.display()
                ),
            ));
        }
    }

    let builder = overrides
        .builder
        .clone()
        .or_else(|| extract.builder.clone())
        .filter(|b| !b.trim().is_empty());

    Ok(ResolvedOptions {
        cache_map,
        scratch_dir,
        utility_image: overrides
            .utility_image
            .clone()
            .unwrap_or_else(|| extract.utility_image.clone()),
        builder,
        skip_extraction: overrides.skip_extraction || extract.skip_extraction,
        engine: overrides
            .engine
            .clone()
            .unwrap_or_else(|| extract.engine.clone()),
        workdir,
        sudo: overrides.sudo.unwrap_or(extract.sudo),
    })
}

/// Relative scratch directories live inside the working directory
fn anchor(workdir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workdir.join(path)
    }
}
