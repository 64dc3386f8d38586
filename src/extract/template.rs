//! Dancefile generation
//!
//! The generated build copies a freshly written `buildstamp` before the
//! cache RUN so the RUN layer is never served from the build cache: the
//! mount contents change between builds without changing any other input.

use crate::cache::CacheSource;
use crate::orchestration::CONTAINER_CACHE_ROOT;

/// File name of the generated build-file inside the scratch directory
pub const DANCEFILE_NAME: &str = "Dancefile.extract";

/// File name of the cache-busting timestamp inside the scratch directory
pub const BUILDSTAMP_NAME: &str = "buildstamp";

/// Render the extraction Dancefile for one cache source
pub fn render(source: &CacheSource, target_path: &str, mount_args: &str, image: &str) -> String {
    let dest = format!("{}/{}", CONTAINER_CACHE_ROOT, source);

    let mut lines = Vec::new();
    lines.push(format!("FROM {}", image));
    lines.push(format!("COPY {0} {0}", BUILDSTAMP_NAME));
    lines.push(format!("RUN --mount={} \\", mount_args));
    lines.push(format!("    echo \"Contents of {}:\" && \\", target_path));
    lines.push(format!("    ls -la {} && \\", target_path));
    lines.push(format!("    mkdir -p {} && \\", dest));
    lines.push(format!("    cp -p -R {}/. {} && \\", target_path, dest));
    lines.push(format!("    echo \"Contents of {}:\" && \\", dest));
    lines.push(format!("    ls -la {}", dest));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
