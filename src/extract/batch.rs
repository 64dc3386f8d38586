//! Batch orchestration
//!
//! Sources share the extraction image tag and container name, so they are
//! processed one at a time in map order. The first failure ends the batch.

use crate::cache::{CacheMap, ResolvedOptions};
use crate::error::DanceResult;
use crate::extract::pipeline::{ExtractSettings, Extractor};
use crate::extract::progress::ProgressSink;
use crate::orchestration::{ContainerEngine, ProcessRunner};
use tracing::info;

/// What a batch did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// `skip_extraction` was set; nothing ran
    Skipped,
    /// Number of sources extracted
    Extracted(usize),
}

impl Extractor<'_> {
    /// Extract every source in order, stopping at the first error
    pub async fn run(&self, map: &CacheMap) -> DanceResult<usize> {
        let total = map.len();
        for (index, (source, options)) in map.iter().enumerate() {
            info!("Extracting cache {}/{}: {}", index + 1, total, source);
            self.extract(source, options).await?;
        }
        Ok(total)
    }
}

/// Extract all resolved caches
pub async fn extract_caches(
    resolved: &ResolvedOptions,
    runner: &dyn ProcessRunner,
    progress: &dyn ProgressSink,
) -> DanceResult<BatchOutcome> {
    if resolved.skip_extraction {
        info!("skip_extraction is set, skipping extraction");
        return Ok(BatchOutcome::Skipped);
    }

    if resolved.cache_map.is_empty() {
        info!("No caches configured");
    }

    let extractor = Extractor::new(
        runner,
        progress,
        ContainerEngine::new(&resolved.engine),
        ExtractSettings::from(resolved),
    );

    let count = extractor.run(&resolved.cache_map).await?;
    Ok(BatchOutcome::Extracted(count))
}
