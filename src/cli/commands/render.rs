//! Render command - print the Dancefile for one cache source

use crate::cache::{resolve, CacheSource, Overrides};
use crate::cli::args::RenderArgs;
use crate::config::Config;
use crate::error::{DanceError, DanceResult};
use crate::extract;

/// Execute the render command
pub async fn execute(args: RenderArgs, config: &Config) -> DanceResult<()> {
    let overrides = Overrides {
        cache_map: args.cache_map,
        utility_image: args.utility_image,
        ..Overrides::default()
    };
    let resolved = resolve(config, &overrides)?;

    let source = CacheSource::new(args.source)?;
    let options = resolved
        .cache_map
        .get(&source)
        .ok_or_else(|| DanceError::CacheSourceNotFound(source.to_string()))?;

    print!(
        "{}",
        extract::render(
            &source,
            options.target_path(),
            options.mount_args(),
            &resolved.utility_image,
        )
    );
    Ok(())
}
