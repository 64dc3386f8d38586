//! Extract command - pull mount caches onto the host

use crate::cache::resolve;
use crate::cli::args::ExtractArgs;
use crate::config::Config;
use crate::error::DanceResult;
use crate::extract::{extract_caches, BatchOutcome, TracingProgress};
use crate::orchestration::NativeRunner;
use console::style;
use tracing::debug;

/// Execute the extract command
pub async fn execute(args: ExtractArgs, config: &Config) -> DanceResult<()> {
    let resolved = resolve(config, &args.overrides())?;
    debug!(
        "Resolved {} cache(s), scratch dir {}, workdir {}",
        resolved.cache_map.len(),
        resolved.scratch_dir.display(),
        resolved.workdir.display()
    );

    let runner = NativeRunner::new();
    match extract_caches(&resolved, &runner, &TracingProgress).await? {
        BatchOutcome::Skipped => {
            println!(
                "{} skip-extraction is set, nothing extracted",
                style("!").yellow()
            );
        }
        BatchOutcome::Extracted(0) => {
            println!("{} No caches configured", style("!").yellow());
        }
        BatchOutcome::Extracted(count) => {
            println!(
                "{} Extracted {} cache(s) into {}",
                style("✓").green(),
                count,
                style(resolved.workdir.display()).cyan()
            );
        }
    }

    Ok(())
}
